// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::PasswordRequirements;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "board.toml";

/// Prefix for environment overrides, e.g. `BOARD_SESSION__TIMEOUT_SECS`
pub const ENV_PREFIX: &str = "BOARD_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Key the session cookie is sealed with. A random key is generated
    /// when unset, which logs everyone out on restart.
    pub secret_key: Option<String>,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    pub admin: AdminSettings,
    pub password: PasswordSettings,
}

/// Where the document store lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root data directory
    pub path: PathBuf,
    /// Sub-directory isolating one board's documents
    pub namespace: String,
}

/// Session cookie and inactivity timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum idle gap between two requests, in seconds
    pub timeout_secs: u64,
    pub cookie_name: String,
    /// Add the `Secure` attribute to the cookie
    pub secure_cookie: bool,
}

/// First-run admin account and admin route prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    /// Extra path segment under `/admin`. Obscurity only; every admin
    /// route still checks the caller's role.
    pub path_secret: Option<String>,
}

/// Password policy and hashing cost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
    /// scrypt `log_n`
    pub hash_cost: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            log_level: "info".to_string(),
            log_json: false,
            secret_key: None,
            storage: StorageSettings::default(),
            session: SessionSettings::default(),
            admin: AdminSettings::default(),
            password: PasswordSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            namespace: "board".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            cookie_name: "board_session".to_string(),
            secure_cookie: false,
        }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "Admin@123".to_string(),
            email: "admin@example.com".to_string(),
            phone: "0000000000".to_string(),
            path_secret: None,
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
            hash_cost: 15,
        }
    }
}

impl SessionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PasswordSettings {
    pub fn requirements(&self) -> PasswordRequirements {
        PasswordRequirements {
            min_length: self.min_length,
            require_uppercase: self.require_uppercase,
            require_lowercase: self.require_lowercase,
            require_digit: self.require_digit,
            require_special: self.require_special,
        }
    }
}

impl Settings {
    /// Layered sources: defaults, then the TOML file, then `BOARD_*` env vars
    pub fn figment<P: AsRef<Path>>(config_file: P) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from `board.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file and the environment
    pub fn load_from<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let settings: Settings = Self::figment(config_file).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run safely with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session.timeout_secs == 0 {
            bail!("session.timeout_secs must be greater than zero");
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("session.cookie_name must be a non-empty token");
        }
        if self.storage.namespace.is_empty()
            || !self
                .storage
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("storage.namespace must be a non-empty token");
        }
        if self.password.min_length < 6 {
            bail!("password.min_length must be at least 6");
        }
        if !(1..=20).contains(&self.password.hash_cost) {
            bail!("password.hash_cost must be between 1 and 20");
        }
        if let Some(secret) = &self.admin.path_secret {
            if secret.is_empty()
                || !secret
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                bail!("admin.path_secret must be a URL-safe path segment");
            }
        }
        if matches!(&self.secret_key, Some(key) if key.len() < 16) {
            bail!("secret_key must be at least 16 characters");
        }
        if self.admin.username.is_empty() || self.admin.password.is_empty() {
            bail!("admin.username and admin.password must be set");
        }
        Ok(())
    }

    /// Directory holding this board's documents
    pub fn data_root(&self) -> PathBuf {
        self.storage.path.join(&self.storage.namespace)
    }
}

#[cfg(test)]
mod config_tests;
