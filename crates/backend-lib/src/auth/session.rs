// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
/** Client-held session state and its sealed transport form.

The server keeps no session table. The state travels in a cookie as
`base64url(nonce || AES-256-GCM(json))`, keyed by SHA-256 of the server
secret, so the client can neither read nor alter it. */
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use board_common::Role;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// AES-GCM nonce size in bytes
const NONCE_LEN: usize = 12;

/// Session fields as carried by the token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Canonical UTC timestamp of the last validated request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
}

impl SessionState {
    /// Fresh state for a user who just logged in
    pub fn for_user(username: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            username: Some(username.into()),
            role: Some(role),
            last_active: Some(format_timestamp(now)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.role.is_none() && self.last_active.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record activity at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = Some(format_timestamp(now));
    }
}

/// Serialize an instant in the one canonical form: RFC 3339, UTC, whole
/// seconds, `Z` suffix. Lexical order equals chronological order.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp into UTC.
///
/// Offsets are normalized to UTC; a value without an offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Ok(aware.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(AppError::MalformedSessionTimestamp(raw.to_string()))
}

/// Seals and opens session tokens
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl SessionCodec {
    /// Derive the cipher key from the server secret
    pub fn new(secret: &str) -> Result<Self, AppError> {
        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| AppError::Crypto(format!("invalid session key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt the state into a URL/cookie-safe token
    pub fn seal(&self, state: &SessionState) -> Result<String, AppError> {
        let json = serde_json::to_vec(state)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let encrypted = self
            .cipher
            .encrypt(&nonce, json.as_slice())
            .map_err(|_| AppError::Crypto("session encryption failed".to_string()))?;

        // Combine nonce and encrypted data
        let mut combined = Vec::with_capacity(NONCE_LEN + encrypted.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&encrypted);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Decrypt a token. `None` for anything that was not sealed by this key.
    pub fn open(&self, token: &str) -> Option<SessionState> {
        let combined = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        if combined.len() <= NONCE_LEN {
            return None;
        }

        let (nonce_bytes, encrypted) = combined.split_at(NONCE_LEN);
        let decrypted = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .ok()?;
        serde_json::from_slice(&decrypted).ok()
    }
}
