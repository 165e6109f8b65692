pub mod document;
pub mod models;
mod posts;

pub use document::{
    DocumentBackend, FileBackend, JsonCollection, MemoryBackend, StorageError, Transaction,
};
pub use posts::{PostKey, PostStore};
