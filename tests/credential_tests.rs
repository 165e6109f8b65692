use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bulletin_board::auth::{CredentialStore, CredentialVerifier, Pbkdf2Verifier, Principal};
use bulletin_board::error::{BoardError, BoardResult};
use bulletin_board::storage::{FileBackend, MemoryBackend};

/// Reversible stand-in so tests can inspect what was persisted.
struct PlainVerifier;

impl CredentialVerifier for PlainVerifier {
    fn hash(&self, password: &str) -> BoardResult<String> {
        Ok(format!("plain:{password}"))
    }

    fn matches(&self, password: &str, verifier: &str) -> bool {
        verifier.strip_prefix("plain:") == Some(password)
    }
}

/// Counts verifier work so tests can see which paths pay for a comparison.
#[derive(Default)]
struct CountingVerifier {
    hashes: AtomicUsize,
    comparisons: AtomicUsize,
}

impl CredentialVerifier for CountingVerifier {
    fn hash(&self, password: &str) -> BoardResult<String> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        PlainVerifier.hash(password)
    }

    fn matches(&self, password: &str, verifier: &str) -> bool {
        self.comparisons.fetch_add(1, Ordering::SeqCst);
        PlainVerifier.matches(password, verifier)
    }
}

fn memory_store() -> CredentialStore {
    CredentialStore::new(
        Arc::new(MemoryBackend::new("users.json")),
        Arc::new(Pbkdf2Verifier::new(1_000)),
    )
}

#[tokio::test]
async fn test_register_then_verify() {
    let store = memory_store();
    store.register("alice", "secret1").await.unwrap();

    let principal = store.verify("alice", "secret1").await.unwrap();
    assert_eq!(principal, Principal::new("alice"));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user() {
    let store = memory_store();
    store.register("alice", "secret1").await.unwrap();

    assert!(matches!(
        store.verify("alice", "secret2").await,
        Err(BoardError::InvalidCredentials)
    ));
    assert!(matches!(
        store.verify("mallory", "secret1").await,
        Err(BoardError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_usernames_are_unique_and_case_sensitive() {
    let store = memory_store();
    store.register("alice", "secret1").await.unwrap();

    let err = store.register("alice", "other").await.unwrap_err();
    assert!(matches!(err, BoardError::UsernameTaken(ref name) if name == "alice"));

    store.register("Alice", "other").await.unwrap();
    assert!(store.verify("Alice", "other").await.is_ok());
    assert!(store.verify("alice", "other").await.is_err());
    assert!(store.verify("alice", "secret1").await.is_ok());
}

#[tokio::test]
async fn test_persisted_layout_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");

    let store = CredentialStore::new(
        Arc::new(FileBackend::new(&path).unwrap()),
        Arc::new(PlainVerifier),
    );
    store.register("alice", "secret1").await.unwrap();
    store.register("bob", "hunter2").await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!([
            { "username": "alice", "password": "plain:secret1" },
            { "username": "bob", "password": "plain:hunter2" }
        ])
    );

    let reopened = CredentialStore::new(
        Arc::new(FileBackend::new(&path).unwrap()),
        Arc::new(PlainVerifier),
    );
    assert!(reopened.verify("bob", "hunter2").await.is_ok());
}

#[tokio::test]
async fn test_passwords_are_not_stored_in_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    let store = CredentialStore::new(
        Arc::new(FileBackend::new(&path).unwrap()),
        Arc::new(Pbkdf2Verifier::new(1_000)),
    );
    store.register("alice", "secret1").await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("secret1"));
    assert!(raw.contains("pbkdf2-sha256$"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_same_name() {
    let store = Arc::new(memory_store());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.register("alice", &format!("pw{i}")).await
        }));
    }

    let mut registered = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => registered += 1,
            Err(BoardError::UsernameTaken(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(registered, 1);
}

#[tokio::test]
async fn test_unknown_user_still_runs_a_comparison() {
    let verifier = Arc::new(CountingVerifier::default());
    let store = CredentialStore::new(
        Arc::new(MemoryBackend::new("users.json")),
        verifier.clone(),
    );
    store.register("alice", "secret1").await.unwrap();
    assert_eq!(verifier.hashes.load(Ordering::SeqCst), 1);

    for _ in 0..2 {
        assert!(matches!(
            store.verify("mallory", "decoy password for unknown users").await,
            Err(BoardError::InvalidCredentials)
        ));
    }
    assert_eq!(verifier.comparisons.load(Ordering::SeqCst), 2);
    // The decoy verifier is derived once and reused
    assert_eq!(verifier.hashes.load(Ordering::SeqCst), 2);

    assert!(store.verify("alice", "secret1").await.is_ok());
    assert_eq!(verifier.comparisons.load(Ordering::SeqCst), 3);
}
