mod local;
mod manager;

pub use local::LocalStore;
pub use manager::{
    generate_stored_name, is_valid_stored_name, sanitize_original_name, AttachmentLimits,
    AttachmentManager, Upload,
};

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Attachment not found: {0}")]
    NotFound(String),
    #[error("Invalid attachment name: {0}")]
    InvalidName(String),
}

/// Abstraction over attachment storage backends.
/// Keys are stored filenames that the manager has already generated or validated.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist a new attachment. Never overwrites an existing one.
    async fn put(&self, name: &str, data: Bytes) -> Result<(), AttachmentError>;
    async fn resolve(&self, name: &str) -> Result<PathBuf, AttachmentError>;
    async fn delete(&self, name: &str) -> Result<(), AttachmentError>;
}
