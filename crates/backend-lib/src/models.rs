//! Server-side account record.
use board_common::{Role, UserProfile};
use serde::{Deserialize, Serialize};

/// Account document as kept by the credential store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique key
    pub username: String,
    /// PHC string produced by the password hasher
    pub password_hash: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Public view with the password hash dropped
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// A single-field change applied atomically by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserUpdate {
    Role(Role),
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        match self {
            UserUpdate::Role(role) => user.role = role,
        }
    }
}
