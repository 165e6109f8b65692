use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{AttachmentError, AttachmentStore};

/// Upload directory on the local filesystem.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

fn not_found_or_io(name: &str, e: std::io::Error) -> AttachmentError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AttachmentError::NotFound(name.to_string())
    } else {
        AttachmentError::Io(e)
    }
}

#[async_trait]
impl AttachmentStore for LocalStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<(), AttachmentError> {
        let path = self.object_path(name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn resolve(&self, name: &str) -> Result<PathBuf, AttachmentError> {
        let path = self.object_path(name);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;
        if !metadata.is_file() {
            return Err(AttachmentError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    async fn delete(&self, name: &str) -> Result<(), AttachmentError> {
        let path = self.object_path(name);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))
    }
}
