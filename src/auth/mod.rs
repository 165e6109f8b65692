//! Accounts, password verification and login sessions.

mod credentials;
mod session;
mod verifier;

pub use credentials::CredentialStore;
pub use session::SessionStore;
pub use verifier::{CredentialVerifier, Pbkdf2Verifier};

use serde::{Deserialize, Serialize};

/// The authenticated identity making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
