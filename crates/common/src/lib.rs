// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the message board server and its clients.
//! Everything here is safe to put on the wire: no type in this crate
//! carries a password hash.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse-grained permission tier of an account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular board member
    #[default]
    User,
    /// May promote, demote, list and remove accounts
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Public view of an account (password hash excluded)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

/// Registration form
/// # Fields
/// * `username` - Unique account key
/// * `password` - Plain password, hashed before it is stored
/// * `email` - Contact email
/// * `phone` - Contact phone number
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
}

/// Login form
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// A board post as submitted by its author
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewMessage {
    pub title: String,
    pub body: String,
}

/// A stored board post
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author (foreign key to the account username)
    pub username: String,
    pub title: String,
    pub body: String,
}

/// Outcome of an admin action
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdminActionResponse {
    pub success: bool,
    /// Account the action targeted
    pub username: String,
}
