use thiserror::Error;
use uuid::Uuid;

use crate::attachments::AttachmentError;
use crate::storage::StorageError;

/// Failures surfaced by the credential store, post store and post service.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("You can only modify your own posts")]
    Forbidden,
    #[error("Invalid post index {index} (there are {len} posts)")]
    InvalidIndex { index: usize, len: usize },
    #[error("Post {0} not found")]
    PostNotFound(Uuid),
    #[error("No files uploaded")]
    NoFilesProvided,
    #[error("Too many files: at most {max} per upload")]
    TooManyFiles { max: usize },
    #[error("File '{name}' exceeds the maximum size of {max} bytes")]
    FileTooLarge { name: String, max: u64 },
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Attachment storage error: {0}")]
    AttachmentIo(std::io::Error),
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

impl From<AttachmentError> for BoardError {
    fn from(e: AttachmentError) -> Self {
        match e {
            AttachmentError::NotFound(name) | AttachmentError::InvalidName(name) => {
                BoardError::NotFound(name)
            }
            AttachmentError::Io(e) => BoardError::AttachmentIo(e),
        }
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
