use std::path::PathBuf;

use thiserror::Error;

use crate::attachments::AttachmentLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    /// Maximum number of files accepted by one upload
    pub max_files_per_upload: usize,
    /// Maximum size of a single uploaded file in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
}

/// Where the user and post documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    /// Process memory only; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding `users.json` and `posts.json`
    pub data_dir: PathBuf,
    /// Directory holding uploaded attachments
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PBKDF2 iterations for new password verifiers
    pub password_iterations: u32,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./uploads"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_iterations: 100_000,
            secure_cookies: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let limits = AttachmentLimits::default();
        Self {
            node: NodeConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            max_files_per_upload: limits.max_files,
            max_upload_size: limits.max_file_size,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or(defaults.node.bind_address);

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "file".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::File,
        };

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_dir);

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.upload_dir);

        let max_files_per_upload = std::env::var("MAX_FILES_PER_UPLOAD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_files_per_upload);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_upload_size);

        let password_iterations = std::env::var("PASSWORD_ITERATIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.auth.password_iterations);

        let secure_cookies = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            node: NodeConfig { bind_address },
            storage: StorageConfig {
                backend,
                data_dir,
                upload_dir,
            },
            auth: AuthConfig {
                password_iterations,
                secure_cookies,
            },
            max_files_per_upload,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files_per_upload == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_FILES_PER_UPLOAD must be at least 1".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.auth.password_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "PASSWORD_ITERATIONS must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::File
            && self.storage.data_dir == self.storage.upload_dir
        {
            return Err(ConfigError::ValidationError(
                "DATA_DIR and UPLOAD_DIR must be different directories".to_string(),
            ));
        }

        if self.auth.password_iterations < 10_000 {
            tracing::warn!(
                "PASSWORD_ITERATIONS is {}. Values below 10000 weaken brute-force resistance.",
                self.auth.password_iterations
            );
        }

        Ok(())
    }

    pub fn attachment_limits(&self) -> AttachmentLimits {
        AttachmentLimits {
            max_files: self.max_files_per_upload,
            max_file_size: self.max_upload_size,
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.storage.data_dir.join("users.json")
    }

    pub fn posts_path(&self) -> PathBuf {
        self.storage.data_dir.join("posts.json")
    }
}
