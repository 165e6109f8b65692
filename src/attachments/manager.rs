use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use super::{AttachmentError, AttachmentStore};
use crate::error::{BoardError, BoardResult};

const MAX_ORIGINAL_NAME_LEN: usize = 100;
const MAX_STORED_NAME_LEN: usize = 255;
const NAME_ATTEMPTS: usize = 3;

/// One file received from the upload ingress.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttachmentLimits {
    pub max_files: usize,
    /// Per-file ceiling in bytes
    pub max_file_size: u64,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_file_size: 50 * 1024 * 1024,
        }
    }
}

/// Owns the lifecycle of uploaded files: naming, storing, resolving, deleting.
pub struct AttachmentManager {
    store: Arc<dyn AttachmentStore>,
    limits: AttachmentLimits,
}

impl AttachmentManager {
    pub fn new(store: Arc<dyn AttachmentStore>, limits: AttachmentLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> AttachmentLimits {
        self.limits
    }

    /// Enforce the per-upload count and per-file size ceilings.
    pub fn check_batch(&self, uploads: &[Upload]) -> BoardResult<()> {
        if uploads.len() > self.limits.max_files {
            return Err(BoardError::TooManyFiles {
                max: self.limits.max_files,
            });
        }
        uploads.iter().try_for_each(|u| self.check_size(u))
    }

    fn check_size(&self, upload: &Upload) -> BoardResult<()> {
        if upload.size() > self.limits.max_file_size {
            return Err(BoardError::FileTooLarge {
                name: upload.original_name.clone(),
                max: self.limits.max_file_size,
            });
        }
        Ok(())
    }

    /// Persist one upload under a freshly generated name and return that name.
    pub async fn store(&self, upload: &Upload) -> BoardResult<String> {
        self.check_size(upload)?;

        let mut last_err = None;
        for _ in 0..NAME_ATTEMPTS {
            let name = generate_stored_name(&upload.original_name);
            match self.store.put(&name, upload.data.clone()).await {
                Ok(()) => {
                    tracing::debug!(stored_name = %name, bytes = upload.size(), "Stored attachment");
                    return Ok(name);
                }
                Err(AttachmentError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(BoardError::AttachmentIo(last_err.unwrap_or_else(|| {
            std::io::Error::from(std::io::ErrorKind::AlreadyExists)
        })))
    }

    /// Store a whole upload batch. On failure, files stored so far are removed.
    pub async fn store_all(&self, uploads: &[Upload]) -> BoardResult<Vec<String>> {
        self.check_batch(uploads)?;

        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.store(upload).await {
                Ok(name) => stored.push(name),
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Map a stored name to its on-disk location for download.
    pub async fn resolve_path(&self, name: &str) -> BoardResult<PathBuf> {
        if !is_valid_stored_name(name) {
            return Err(AttachmentError::InvalidName(name.to_string()).into());
        }
        Ok(self.store.resolve(name).await?)
    }

    pub async fn delete(&self, name: &str) -> BoardResult<()> {
        Ok(self.remove(name).await?)
    }

    async fn remove(&self, name: &str) -> Result<(), AttachmentError> {
        if !is_valid_stored_name(name) {
            return Err(AttachmentError::InvalidName(name.to_string()));
        }
        self.store.delete(name).await
    }

    /// Remove attachments orphaned by a deleted post.
    ///
    /// Every name is attempted. Files that are already gone, and names that
    /// cannot refer to a file in the upload directory, are logged and skipped.
    /// The first IO failure is returned once all were attempted.
    pub async fn purge(&self, names: &[String]) -> BoardResult<()> {
        let mut first_err = None;
        for name in names {
            match self.remove(name).await {
                Ok(()) => tracing::debug!(stored_name = %name, "Deleted attachment"),
                Err(AttachmentError::NotFound(_)) => {
                    tracing::warn!(stored_name = %name, "Attachment already missing");
                }
                Err(AttachmentError::InvalidName(_)) => {
                    tracing::error!(stored_name = %name, "Post referenced an unsafe attachment name");
                }
                Err(AttachmentError::Io(e)) => {
                    tracing::error!(stored_name = %name, error = %e, "Failed to delete attachment");
                    first_err.get_or_insert(BoardError::AttachmentIo(e));
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Best-effort removal of attachments from an aborted upload. Failures are logged, not returned.
    pub async fn discard(&self, names: &[String]) {
        for name in names {
            match self.remove(name).await {
                Ok(()) => tracing::debug!(stored_name = %name, "Deleted attachment"),
                Err(AttachmentError::NotFound(_)) => {
                    tracing::warn!(stored_name = %name, "Attachment already missing");
                }
                Err(e) => {
                    tracing::warn!(stored_name = %name, error = %e, "Failed to delete attachment");
                }
            }
        }
    }
}

// ============================================================================
// Naming
// ============================================================================

/// `<unix-millis>-<8 hex>-<sanitized original name>`
pub fn generate_stored_name(original_name: &str) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &nonce[..8],
        sanitize_original_name(original_name)
    )
}

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_original_name(original_name: &str) -> String {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "_.");
    }

    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_ORIGINAL_NAME_LEN)
        .collect();

    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed
    }
}

/// Whether `name` is a single path component that is safe to join onto the
/// storage root. Older posts carry names such as `<millis>-report..final.pdf`,
/// so dots inside a name are accepted.
pub fn is_valid_stored_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.len() <= MAX_STORED_NAME_LEN
        && !name.contains(['/', '\\', '\0'])
}
