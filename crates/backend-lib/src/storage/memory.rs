//! In-memory store, used by tests and throwaway runs.
use async_trait::async_trait;
use board_common::{Message, UserProfile};
use dashmap::{mapref::entry::Entry, DashMap};

use super::{store_key, CredentialStore, MessageStore};
use crate::error::AppError;
use crate::models::{User, UserUpdate};

/// `DashMap`-backed store keyed by `store_key`; each call holds the
/// shard lock for one key
#[derive(Debug, Default)]
pub struct MemoryStorage {
    users: DashMap<String, User>,
    messages: DashMap<String, Vec<Message>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStorage {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.entry(store_key(&user.username)) {
            Entry::Occupied(_) => Err(AppError::DuplicateUser),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            },
        }
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&store_key(username)).map(|user| user.clone()))
    }

    async fn update_user(&self, username: &str, update: UserUpdate) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&store_key(username))
            .ok_or(AppError::NotFound)?;
        update.apply(&mut user);
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        self.users
            .remove(&store_key(username))
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let mut profiles: Vec<UserProfile> =
            self.users.iter().map(|entry| entry.value().profile()).collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }
}

#[async_trait]
impl MessageStore for MemoryStorage {
    async fn append_message(&self, message: &Message) -> Result<(), AppError> {
        self.messages
            .entry(store_key(&message.username))
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn messages_for(&self, username: &str) -> Result<Vec<Message>, AppError> {
        Ok(self
            .messages
            .get(&store_key(username))
            .map(|messages| messages.clone())
            .unwrap_or_default())
    }
}
