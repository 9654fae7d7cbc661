use std::sync::Arc;

use board_common::{RegisterRequest, Role, UserProfile};
use metrics::counter;
use tracing::{info, warn};

use super::password::CredentialHasher;
use super::token_generator::generate_secret_key;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_REGISTERED};
use crate::models::User;
use crate::storage::CredentialStore;

/// Registration and credential verification
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    /// Hash of a random secret, verified against when the username is
    /// unknown so both login failures cost one verification
    decoy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self, AppError> {
        let decoy_hash = hasher.hash(&generate_secret_key())?;
        Ok(Self {
            users,
            hasher,
            decoy_hash,
        })
    }

    /// Create a regular account.
    ///
    /// Fails with `DuplicateUser` when the username is taken; nothing is
    /// written in that case.
    pub async fn register(&self, candidate: RegisterRequest) -> Result<UserProfile, AppError> {
        if self.users.find_user(&candidate.username).await?.is_some() {
            warn!(username = %candidate.username, "registration rejected: username taken");
            return Err(AppError::DuplicateUser);
        }

        let password_hash = self.hash(candidate.password).await?;
        let user = User {
            username: candidate.username,
            password_hash,
            email: candidate.email,
            phone: candidate.phone,
            role: Role::User,
        };

        // The store re-checks uniqueness atomically, closing the race
        // between the lookup above and this insert
        self.users.insert_user(&user).await?;

        counter!(USER_REGISTERED).increment(1);
        info!(username = %user.username, "user registered");
        Ok(user.profile())
    }

    /// Verify credentials and return the account for session setup.
    ///
    /// Unknown user and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.users.find_user(username).await?;
        let hash = user
            .as_ref()
            .map_or_else(|| self.decoy_hash.clone(), |u| u.password_hash.clone());

        let verified = self.verify(hash, password.to_string()).await?;

        match user {
            Some(user) if verified => {
                counter!(LOGIN_SUCCEEDED).increment(1);
                info!(username = %user.username, role = %user.role, "login succeeded");
                Ok(user)
            },
            _ => {
                counter!(LOGIN_FAILED).increment(1);
                warn!(username = %username, "login failed");
                Err(AppError::InvalidCredentials)
            },
        }
    }

    /// Hash off the async worker threads
    pub async fn hash(&self, plain: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify(&self, hash: String, plain: String) -> Result<bool, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &plain))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))
    }
}
