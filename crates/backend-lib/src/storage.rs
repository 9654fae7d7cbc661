// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
//!
//! Every mutating call is a single atomic operation on one document, so
//! services never need a read-then-write across two calls.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use board_common::{Message, UserProfile};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};

use crate::error::AppError;
use crate::models::{User, UserUpdate};

mod memory;

pub use memory::MemoryStorage;

/// Persistence for account documents, keyed by username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new account. Fails with `DuplicateUser` if the key is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    /// Look an account up by username
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Apply a field update. Fails with `NotFound` if the account is absent.
    async fn update_user(&self, username: &str, update: UserUpdate) -> Result<(), AppError>;

    /// Delete an account. Fails with `NotFound` if the account is absent.
    async fn delete_user(&self, username: &str) -> Result<(), AppError>;

    /// All accounts with the password hash excluded, ordered by username
    async fn list_users(&self) -> Result<Vec<UserProfile>, AppError>;
}

/// Append-only persistence for board posts
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append_message(&self, message: &Message) -> Result<(), AppError>;

    /// Posts written by `username`, oldest first
    async fn messages_for(&self, username: &str) -> Result<Vec<Message>, AppError>;
}

/// Flat-file implementation of the store traits.
///
/// Layout under `root`:
/// * `users/<username>.json` - one account document
/// * `messages/<username>.log` - one JSON message per line
pub struct FlatFileStorage {
    root: PathBuf,
    // serialises writers; readers rely on rename being atomic
    write_lock: Mutex<()>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("messages"))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn user_path(&self, username: &str) -> Option<PathBuf> {
        is_safe_key(username).then(|| {
            self.root
                .join("users")
                .join(format!("{}.json", store_key(username)))
        })
    }

    fn messages_path(&self, username: &str) -> Option<PathBuf> {
        is_safe_key(username).then(|| {
            self.root
                .join("messages")
                .join(format!("{}.log", store_key(username)))
        })
    }

    async fn read_user(path: &Path) -> Result<Option<User>, AppError> {
        match tokio_fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| corrupt(path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the whole document next to its target, then swap it in
    async fn write_user(path: &Path, user: &User) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(user)?;
        let tmp = path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Lookup key for a username. Usernames are unique ignoring ASCII case,
/// so `Alice` and `alice` are one account in every store, including on
/// case-insensitive filesystems.
pub(crate) fn store_key(username: &str) -> String {
    username.to_ascii_lowercase()
}

/// A stored document that no longer decodes
fn corrupt(path: &Path, err: serde_json::Error) -> AppError {
    AppError::Storage(format!("corrupt document {}: {err}", path.display()))
}

/// Keys become file names, so only a conservative charset is accepted
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[async_trait]
impl CredentialStore for FlatFileStorage {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let path = self
            .user_path(&user.username)
            .ok_or_else(|| AppError::InvalidInput("username".to_string()))?;

        let _guard = self.write_lock.lock().await;
        if tokio_fs::try_exists(&path).await? {
            return Err(AppError::DuplicateUser);
        }
        Self::write_user(&path, user).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        match self.user_path(username) {
            Some(path) => Self::read_user(&path).await,
            None => Ok(None),
        }
    }

    async fn update_user(&self, username: &str, update: UserUpdate) -> Result<(), AppError> {
        let path = self.user_path(username).ok_or(AppError::NotFound)?;

        let _guard = self.write_lock.lock().await;
        let mut user = Self::read_user(&path).await?.ok_or(AppError::NotFound)?;
        update.apply(&mut user);
        Self::write_user(&path, &user).await
    }

    async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        let path = self.user_path(username).ok_or(AppError::NotFound)?;

        let _guard = self.write_lock.lock().await;
        match tokio_fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let mut entries = tokio_fs::read_dir(self.root.join("users")).await?;
        let mut profiles = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // a concurrent delete may win the race
            if let Some(user) = Self::read_user(&path).await? {
                profiles.push(user.profile());
            }
        }

        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }
}

#[async_trait]
impl MessageStore for FlatFileStorage {
    /// Append a JSON line to the author's log
    async fn append_message(&self, message: &Message) -> Result<(), AppError> {
        let path = self
            .messages_path(&message.username)
            .ok_or_else(|| AppError::InvalidInput("username".to_string()))?;

        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn messages_for(&self, username: &str) -> Result<Vec<Message>, AppError> {
        let Some(path) = self.messages_path(username) else {
            return Ok(Vec::new());
        };

        let content = match tokio_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| corrupt(&path, e)))
            .collect()
    }
}
