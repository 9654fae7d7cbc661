// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
pub mod token_generator;
mod service;

pub use password::{
    validate_password_strength, CredentialHasher, PasswordRequirements, ScryptHasher,
};
pub use service::AuthService;
pub use session::{format_timestamp, parse_timestamp, SessionCodec, SessionState};
pub use token_generator::generate_secret_key;
