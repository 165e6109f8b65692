//! Whole-document JSON collections with read / mutate / commit transactions.
//!
//! A collection is a single JSON array persisted through a [`DocumentBackend`].
//! Every mutation reads the entire array, changes it in memory and writes the
//! entire array back. Mutations on one collection are serialized by an
//! in-process lock; plain reads never take it because backends replace the
//! document atomically.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Document {document} is not a valid JSON array: {source}")]
    Corrupt {
        document: String,
        source: serde_json::Error,
    },
}

/// Where a collection document lives.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;
    /// Returns `None` when the document has never been written.
    async fn load(&self) -> Result<Option<Vec<u8>>, StorageError>;
    /// Replaces the whole document. Readers observe either the old or the new content.
    async fn store(&self, data: Vec<u8>) -> Result<(), StorageError>;
}

// ============================================================================
// Flat file backend
// ============================================================================

/// A JSON document on the local filesystem, committed via temp file + rename.
pub struct FileBackend {
    name: String,
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, path })
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_file_name(format!(
            ".{}.{}.tmp",
            self.name,
            uuid::Uuid::new_v4().simple()
        ))
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, data: Vec<u8>) -> Result<(), StorageError> {
        let temp_path = self.temp_path();

        let written: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Keeps the document in process memory. Nothing survives a restart.
pub struct MemoryBackend {
    name: String,
    data: std::sync::Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: std::sync::Mutex::new(None),
        }
    }

    /// Overwrite the raw document, bypassing any collection lock.
    pub fn set_raw(&self, data: impl Into<Vec<u8>>) {
        *self.data.lock().unwrap_or_else(|p| p.into_inner()) = Some(data.into());
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    async fn store(&self, data: Vec<u8>) -> Result<(), StorageError> {
        *self.data.lock().unwrap_or_else(|p| p.into_inner()) = Some(data);
        Ok(())
    }
}

// ============================================================================
// Collections and transactions
// ============================================================================

/// An ordered sequence of `T` persisted as one JSON array.
pub struct JsonCollection<T> {
    backend: Arc<dyn DocumentBackend>,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Read the full collection. A document that was never written reads as empty.
    pub async fn read(&self) -> Result<Vec<T>, StorageError> {
        let data = self.backend.load().await?;
        decode(self.backend.name(), data)
    }

    /// Lock the collection and read it for mutation.
    ///
    /// The lock is held until the returned transaction is committed or dropped.
    /// Dropping without committing leaves the stored document untouched.
    pub async fn begin(&self) -> Result<Transaction<'_, T>, StorageError> {
        let guard = self.lock.lock().await;
        let items = self.read().await?;
        Ok(Transaction {
            _guard: guard,
            backend: self.backend.as_ref(),
            items,
        })
    }
}

fn decode<T: DeserializeOwned>(name: &str, data: Option<Vec<u8>>) -> Result<Vec<T>, StorageError> {
    match data {
        None => Ok(Vec::new()),
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            document: name.to_string(),
            source,
        }),
    }
}

pub struct Transaction<'a, T> {
    _guard: MutexGuard<'a, ()>,
    backend: &'a dyn DocumentBackend,
    items: Vec<T>,
}

impl<T: Serialize> Transaction<'_, T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    /// Write the whole collection back and release the lock.
    pub async fn commit(self) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(&self.items)?;
        self.backend.store(data).await
    }
}
