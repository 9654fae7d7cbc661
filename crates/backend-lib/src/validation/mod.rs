// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for forms arriving over HTTP.

use crate::auth::{validate_password_strength, PasswordRequirements};
use crate::error::AppError;
use board_common::{NewMessage, RegisterRequest};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TITLE_LENGTH: usize = 120;
const MAX_BODY_LENGTH: usize = 5000;

// Regex patterns for validation
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]{2,31}$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 -]{5,19}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone: {0}")]
    InvalidPhone(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "3-32 characters: letters, digits, '_', '-' or '.', not starting with '.'"
                .to_string(),
        ));
    }
    Ok(username)
}

/// Validate a password against the configured policy
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    if !validate_password_strength(password, requirements) {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at least {} characters and meet the complexity rules",
            requirements.min_length
        )));
    }
    Ok(password)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail("malformed address".to_string()));
    }
    Ok(email)
}

/// Validate a phone number
pub fn validate_phone(phone: &str) -> ValidationResult<&str> {
    if !PHONE_REGEX.is_match(phone) {
        return Err(ValidationError::InvalidPhone(
            "6-20 digits, optionally with '+', spaces or '-'".to_string(),
        ));
    }
    Ok(phone)
}

/// Validate a full registration form
pub fn validate_registration(
    form: &RegisterRequest,
    requirements: &PasswordRequirements,
) -> ValidationResult<()> {
    validate_username(&form.username)?;
    validate_password(&form.password, requirements)?;
    validate_email(&form.email)?;
    validate_phone(&form.phone)?;
    Ok(())
}

/// Validate a board post
pub fn validate_message(message: &NewMessage) -> ValidationResult<()> {
    let title = message.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidMessage(format!(
            "title must be 1-{MAX_TITLE_LENGTH} characters"
        )));
    }
    let body = message.body.trim();
    if body.is_empty() || body.chars().count() > MAX_BODY_LENGTH {
        return Err(ValidationError::InvalidMessage(format!(
            "body must be 1-{MAX_BODY_LENGTH} characters"
        )));
    }
    Ok(())
}
