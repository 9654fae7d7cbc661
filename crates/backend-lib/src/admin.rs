// ============================
// crates/backend-lib/src/admin.rs
// ============================
//! Role-gated account administration and first-run admin bootstrap.
use std::sync::Arc;

use board_common::{Role, UserProfile};
use metrics::counter;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::config::AdminSettings;
use crate::error::AppError;
use crate::metrics::{ADMIN_ACTION, ADMIN_DENIED};
use crate::models::{User, UserUpdate};
use crate::storage::CredentialStore;

/// Admin operations. Every mutation checks the actor's role first and
/// stops at the first failed precondition without touching the store.
pub struct AdminService {
    users: Arc<dyn CredentialStore>,
}

impl AdminService {
    pub fn new(users: Arc<dyn CredentialStore>) -> Self {
        Self { users }
    }

    /// Load the acting account from the store. A session naming an
    /// account that no longer exists carries no rights.
    pub async fn resolve_actor(&self, username: &str) -> Result<User, AppError> {
        self.users
            .find_user(username)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Grant the admin role. Promoting an admin is a no-op success.
    pub async fn promote(&self, actor: &User, target: &str) -> Result<(), AppError> {
        let result = async {
            ensure_admin(actor)?;
            self.users
                .update_user(target, UserUpdate::Role(Role::Admin))
                .await
        }
        .await;
        record("promote", actor, target, &result);
        result
    }

    /// Revoke the admin role. Admins cannot demote themselves.
    pub async fn demote(&self, actor: &User, target: &str) -> Result<(), AppError> {
        let result = async {
            ensure_admin(actor)?;
            ensure_not_self(actor, target)?;
            self.users
                .update_user(target, UserUpdate::Role(Role::User))
                .await
        }
        .await;
        record("demote", actor, target, &result);
        result
    }

    /// Delete an account permanently. Admins cannot remove themselves.
    pub async fn remove(&self, actor: &User, target: &str) -> Result<(), AppError> {
        let result = async {
            ensure_admin(actor)?;
            ensure_not_self(actor, target)?;
            self.users.delete_user(target).await
        }
        .await;
        record("remove", actor, target, &result);
        result
    }

    /// Every account without its password hash.
    /// Not role-checked here; callers gate access.
    pub async fn list(&self) -> Result<Vec<UserProfile>, AppError> {
        self.users.list_users().await
    }
}

fn ensure_admin(actor: &User) -> Result<(), AppError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::User => Err(AppError::Unauthorized),
    }
}

/// Usernames are unique ignoring ASCII case, so `ROOT` is still `root`
fn ensure_not_self(actor: &User, target: &str) -> Result<(), AppError> {
    if actor.username.eq_ignore_ascii_case(target) {
        return Err(AppError::SelfActionForbidden);
    }
    Ok(())
}

fn record(action: &'static str, actor: &User, target: &str, result: &Result<(), AppError>) {
    match result {
        Ok(()) => {
            counter!(ADMIN_ACTION, "action" => action).increment(1);
            info!(action, actor = %actor.username, target_user = target, "admin action applied");
        },
        Err(err) => {
            counter!(ADMIN_DENIED, "action" => action).increment(1);
            warn!(action, actor = %actor.username, target_user = target, error = %err, "admin action refused");
        },
    }
}

/// Create the configured admin account if it does not exist yet.
///
/// Returns whether an account was created. Safe to run on every start.
pub async fn bootstrap_admin(
    users: &dyn CredentialStore,
    auth: &AuthService,
    settings: &AdminSettings,
) -> Result<bool, AppError> {
    if users.find_user(&settings.username).await?.is_some() {
        info!(username = %settings.username, "admin account present");
        return Ok(false);
    }

    let admin = User {
        username: settings.username.clone(),
        password_hash: auth.hash(settings.password.clone()).await?,
        email: settings.email.clone(),
        phone: settings.phone.clone(),
        role: Role::Admin,
    };

    match users.insert_user(&admin).await {
        Ok(()) => {
            info!(username = %admin.username, "initial admin created");
            Ok(true)
        },
        // Another process bootstrapped first
        Err(AppError::DuplicateUser) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ScryptHasher;
    use crate::storage::MemoryStorage;

    fn user(name: &str, role: Role) -> User {
        User {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            email: format!("{name}@example.com"),
            phone: "0000000000".to_string(),
            role,
        }
    }

    async fn seeded() -> (AdminService, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new());
        store.insert_user(&user("root", Role::Admin)).await.unwrap();
        store.insert_user(&user("alice", Role::User)).await.unwrap();
        store.insert_user(&user("bob", Role::User)).await.unwrap();
        (AdminService::new(store.clone()), store)
    }

    async fn role_of(store: &MemoryStorage, name: &str) -> Role {
        store.find_user(name).await.unwrap().unwrap().role
    }

    #[tokio::test]
    async fn test_promote_is_idempotent() {
        let (admin, store) = seeded().await;
        let root = admin.resolve_actor("root").await.unwrap();

        admin.promote(&root, "alice").await.unwrap();
        assert_eq!(role_of(&store, "alice").await, Role::Admin);

        admin.promote(&root, "alice").await.unwrap();
        assert_eq!(role_of(&store, "alice").await, Role::Admin);
    }

    #[tokio::test]
    async fn test_non_admin_always_fails() {
        let (admin, store) = seeded().await;
        let alice = admin.resolve_actor("alice").await.unwrap();

        for target in ["bob", "root", "alice", "ghost"] {
            assert!(matches!(
                admin.promote(&alice, target).await,
                Err(AppError::Unauthorized)
            ));
            assert!(matches!(
                admin.remove(&alice, target).await,
                Err(AppError::Unauthorized)
            ));
            assert!(matches!(
                admin.demote(&alice, target).await,
                Err(AppError::Unauthorized)
            ));
        }

        assert_eq!(role_of(&store, "alice").await, Role::User);
        assert_eq!(store.user_count(), 3);
    }

    #[tokio::test]
    async fn test_admin_cannot_remove_or_demote_self() {
        let (admin, store) = seeded().await;
        let root = admin.resolve_actor("root").await.unwrap();

        assert!(matches!(
            admin.remove(&root, "root").await,
            Err(AppError::SelfActionForbidden)
        ));
        assert!(matches!(
            admin.demote(&root, "root").await,
            Err(AppError::SelfActionForbidden)
        ));
        assert!(matches!(
            admin.remove(&root, "ROOT").await,
            Err(AppError::SelfActionForbidden)
        ));
        assert_eq!(role_of(&store, "root").await, Role::Admin);
        assert_eq!(store.user_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let (admin, store) = seeded().await;
        let root = admin.resolve_actor("root").await.unwrap();

        assert!(matches!(
            admin.promote(&root, "ghost").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            admin.remove(&root, "ghost").await,
            Err(AppError::NotFound)
        ));
        assert_eq!(store.user_count(), 3);
    }

    #[tokio::test]
    async fn test_remove_and_demote() {
        let (admin, store) = seeded().await;
        let root = admin.resolve_actor("root").await.unwrap();

        admin.promote(&root, "bob").await.unwrap();
        admin.demote(&root, "bob").await.unwrap();
        assert_eq!(role_of(&store, "bob").await, Role::User);

        admin.remove(&root, "bob").await.unwrap();
        assert!(store.find_user("bob").await.unwrap().is_none());
        assert!(matches!(
            admin.resolve_actor("bob").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_list_excludes_hashes() {
        let (admin, _store) = seeded().await;
        let profiles = admin.list().await.unwrap();
        assert_eq!(profiles.len(), 3);

        let json = serde_json::to_string(&profiles).unwrap();
        assert!(!json.contains("hash"));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = Arc::new(MemoryStorage::new());
        let auth = AuthService::new(
            store.clone(),
            Arc::new(ScryptHasher::with_cost(4).unwrap()),
        )
        .unwrap();
        let settings = AdminSettings::default();

        assert!(bootstrap_admin(store.as_ref(), &auth, &settings).await.unwrap());
        assert!(!bootstrap_admin(store.as_ref(), &auth, &settings).await.unwrap());
        assert_eq!(store.user_count(), 1);

        let admin = auth.login("admin", "Admin@123").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email, "admin@example.com");
    }
}
