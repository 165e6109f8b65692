//! Shared test helpers for bulletin-board router tests.

use std::sync::Arc;

use crate::config::{AuthConfig, Config, NodeConfig, StorageBackend, StorageConfig};
use crate::AppState;

/// Create a test AppState with temporary documents, a temporary upload
/// directory and a cheap password verifier.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::File,
            data_dir: temp_dir.path().join("data"),
            upload_dir: temp_dir.path().join("uploads"),
        },
        auth: AuthConfig {
            password_iterations: 1_000,
            secure_cookies: false,
        },
        max_files_per_upload: 3,
        max_upload_size: 1024 * 1024, // 1MB for tests
    };

    Arc::new(AppState::open(config).expect("Failed to open test state"))
}
