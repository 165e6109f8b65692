//! bulletin-board - A minimal multi-user bulletin board
//!
//! This crate provides account registration, post creation with file
//! attachments, and author-only editing and deletion, with:
//! - Flat JSON documents as the post and user stores, rewritten atomically per mutation
//! - Per-document in-process locking so concurrent mutations never lose updates
//! - An upload directory for attachments, cleaned up when their post is deleted
//! - REST API with multipart upload support and cookie sessions

pub mod api;
pub mod attachments;
pub mod auth;
pub mod config;
pub mod error;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use attachments::{AttachmentManager, LocalStore};
use auth::{CredentialStore, CredentialVerifier, Pbkdf2Verifier, SessionStore};
use config::{Config, StorageBackend};
use service::PostService;
use storage::{DocumentBackend, FileBackend, MemoryBackend, PostStore, StorageError};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub credentials: CredentialStore,
    pub posts: PostService,
    pub sessions: SessionStore,
}

impl AppState {
    /// Open the user and post stores and the upload directory named by `config`.
    pub fn open(config: Config) -> Result<Self, StorageError> {
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(Pbkdf2Verifier::new(config.auth.password_iterations));
        Self::open_with_verifier(config, verifier)
    }

    pub fn open_with_verifier(
        config: Config,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, StorageError> {
        let (users, posts): (Arc<dyn DocumentBackend>, Arc<dyn DocumentBackend>) =
            match config.storage.backend {
                StorageBackend::File => (
                    Arc::new(FileBackend::new(config.users_path())?),
                    Arc::new(FileBackend::new(config.posts_path())?),
                ),
                StorageBackend::Memory => {
                    tracing::warn!(
                        "STORAGE_BACKEND=memory: accounts and posts will not survive a restart"
                    );
                    (
                        Arc::new(MemoryBackend::new("users.json")),
                        Arc::new(MemoryBackend::new("posts.json")),
                    )
                }
            };
        let uploads = Arc::new(LocalStore::new(&config.storage.upload_dir)?);

        let attachments = AttachmentManager::new(uploads, config.attachment_limits());

        Ok(Self {
            credentials: CredentialStore::new(users, verifier),
            posts: PostService::new(PostStore::new(posts), attachments),
            sessions: SessionStore::new(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    #[tokio::test]
    async fn test_memory_backend_writes_no_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                data_dir: dir.path().join("data"),
                upload_dir: dir.path().join("uploads"),
            },
            ..Config::default()
        };
        let state = AppState::open_with_verifier(config, Arc::new(Pbkdf2Verifier::new(1_000)))
            .unwrap();

        state.credentials.register("alice", "secret1").await.unwrap();
        assert!(state.credentials.verify("alice", "secret1").await.is_ok());
        assert!(!dir.path().join("data").exists());
    }
}
