// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the message board server: sessions,
//! authentication and account administration.

pub mod admin;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use tracing::warn;

use crate::admin::AdminService;
use crate::auth::{generate_secret_key, AuthService, CredentialHasher, ScryptHasher, SessionCodec};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::AppError;
use crate::middleware::SessionGuard;
use crate::storage::{CredentialStore, FlatFileStorage, MemoryStorage, MessageStore};

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// Account documents
    pub users: Arc<dyn CredentialStore>,
    /// Board posts
    pub messages: Arc<dyn MessageStore>,
    /// Registration and login
    pub auth: Arc<AuthService>,
    /// Role-gated account administration
    pub admin: Arc<AdminService>,
    /// Seals and opens the session cookie
    pub sessions: Arc<SessionCodec>,
    /// Idle timeout enforcement
    pub guard: Arc<SessionGuard>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the services over explicitly constructed stores
    pub fn new(
        settings: Settings,
        users: Arc<dyn CredentialStore>,
        messages: Arc<dyn MessageStore>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let secret = match &settings.secret_key {
            Some(key) => key.clone(),
            None => {
                warn!("no secret_key configured; sessions will not survive a restart");
                generate_secret_key()
            },
        };

        let sessions = Arc::new(SessionCodec::new(&secret)?);
        let auth = Arc::new(AuthService::new(Arc::clone(&users), hasher)?);
        let admin = Arc::new(AdminService::new(Arc::clone(&users)));
        let guard = Arc::new(SessionGuard::new(
            Arc::clone(&clock),
            settings.session.timeout(),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            users,
            messages,
            auth,
            admin,
            sessions,
            guard,
            clock,
        })
    }

    /// Production wiring: flat-file stores under the configured data
    /// root, scrypt at the configured cost and the system clock
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let storage = Arc::new(FlatFileStorage::new(settings.data_root())?);
        let hasher = Arc::new(ScryptHasher::with_cost(settings.password.hash_cost)?);
        let state = Self::new(
            settings,
            storage.clone(),
            storage,
            hasher,
            Arc::new(SystemClock),
        )?;
        Ok(state)
    }

    /// Ephemeral wiring backed by one in-memory store
    pub fn in_memory(settings: Settings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let storage = Arc::new(MemoryStorage::new());
        let hasher = Arc::new(ScryptHasher::with_cost(settings.password.hash_cost)?);
        Self::new(settings, storage.clone(), storage, hasher, clock)
    }
}
