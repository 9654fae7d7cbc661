use std::sync::Arc;

use backend_lib::{
    error::AppError,
    models::{User, UserUpdate},
    storage::{CredentialStore, FlatFileStorage, MemoryStorage, MessageStore},
};
use board_common::{Message, Role};
use tempfile::TempDir;

fn user(name: &str) -> User {
    User {
        username: name.to_string(),
        password_hash: "$scrypt$placeholder".to_string(),
        email: format!("{name}@example.com"),
        phone: "5550100200".to_string(),
        role: Role::User,
    }
}

fn message(author: &str, title: &str) -> Message {
    Message {
        username: author.to_string(),
        title: title.to_string(),
        body: format!("{title} body"),
    }
}

/// The same contract holds for every credential store
async fn exercise_credentials(store: &dyn CredentialStore) {
    store.insert_user(&user("bob")).await.unwrap();
    store.insert_user(&user("alice")).await.unwrap();

    let mut impostor = user("alice");
    impostor.email = "impostor@example.com".to_string();
    assert!(matches!(
        store.insert_user(&impostor).await,
        Err(AppError::DuplicateUser)
    ));
    let alice = store.find_user("alice").await.unwrap().unwrap();
    assert_eq!(alice.email, "alice@example.com");

    store
        .update_user("alice", UserUpdate::Role(Role::Admin))
        .await
        .unwrap();
    assert_eq!(
        store.find_user("alice").await.unwrap().unwrap().role,
        Role::Admin
    );
    assert!(matches!(
        store.update_user("ghost", UserUpdate::Role(Role::Admin)).await,
        Err(AppError::NotFound)
    ));

    let names: Vec<String> = store
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.username)
        .collect();
    assert_eq!(names, ["alice", "bob"]);

    // Keys ignore ASCII case
    let mut shouting = user("ALICE");
    shouting.email = "shout@example.com".to_string();
    assert!(matches!(
        store.insert_user(&shouting).await,
        Err(AppError::DuplicateUser)
    ));
    let found = store.find_user("Alice").await.unwrap().unwrap();
    assert_eq!(found.username, "alice");

    store.delete_user("bob").await.unwrap();
    assert!(store.find_user("bob").await.unwrap().is_none());
    assert!(matches!(
        store.delete_user("bob").await,
        Err(AppError::NotFound)
    ));
    assert!(store.find_user("nobody").await.unwrap().is_none());
}

async fn exercise_messages(store: &dyn MessageStore) {
    assert!(store.messages_for("alice").await.unwrap().is_empty());

    store.append_message(&message("alice", "one")).await.unwrap();
    store.append_message(&message("bob", "other")).await.unwrap();
    store.append_message(&message("alice", "two")).await.unwrap();

    let titles: Vec<String> = store
        .messages_for("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, ["one", "two"]);
}

#[tokio::test]
async fn test_flat_file_credentials() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStorage::new(dir.path()).unwrap();
    exercise_credentials(&store).await;
}

#[tokio::test]
async fn test_memory_credentials() {
    exercise_credentials(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn test_flat_file_messages() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStorage::new(dir.path()).unwrap();
    exercise_messages(&store).await;
}

#[tokio::test]
async fn test_memory_messages() {
    exercise_messages(&MemoryStorage::new()).await;
}

#[tokio::test]
async fn test_flat_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = FlatFileStorage::new(dir.path()).unwrap();
        store.insert_user(&user("alice")).await.unwrap();
        store.append_message(&message("alice", "kept")).await.unwrap();
    }

    let reopened = FlatFileStorage::new(dir.path()).unwrap();
    assert!(reopened.find_user("alice").await.unwrap().is_some());
    assert_eq!(reopened.messages_for("alice").await.unwrap().len(), 1);

    // Documents are plain JSON with no temp files left behind
    let files: Vec<_> = std::fs::read_dir(dir.path().join("users"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files, ["alice.json"]);
}

#[tokio::test]
async fn test_flat_file_rejects_path_traversal() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStorage::new(dir.path().join("board")).unwrap();

    let mut evil = user("x");
    evil.username = "../escape".to_string();
    assert!(matches!(
        store.insert_user(&evil).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(store.find_user("../escape").await.unwrap().is_none());
    assert!(matches!(
        store.delete_user("../../etc/passwd").await,
        Err(AppError::NotFound)
    ));
    assert!(!dir.path().join("escape.json").exists());
}

#[tokio::test]
async fn test_concurrent_inserts_admit_exactly_one() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlatFileStorage::new(dir.path()).unwrap());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.insert_user(&user("racer")).await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => created += 1,
            Err(AppError::DuplicateUser) => {},
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_corrupt_document_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let store = FlatFileStorage::new(dir.path()).unwrap();
    std::fs::write(dir.path().join("users").join("alice.json"), b"{ not json").unwrap();
    std::fs::write(dir.path().join("messages").join("alice.log"), b"garbage\n").unwrap();

    let err = store.find_user("alice").await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(err.error_code(), "STORE_001");
    assert!(!err.sanitized_message().contains("alice"));

    assert!(matches!(
        store.messages_for("alice").await,
        Err(AppError::Storage(_))
    ));
}
