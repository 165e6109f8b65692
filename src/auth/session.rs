use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::Principal;
use crate::error::{BoardError, BoardResult};

const TOKEN_LEN: usize = 32;

/// In-memory login sessions keyed by an opaque random token.
pub struct SessionStore {
    rng: SystemRandom,
    sessions: RwLock<HashMap<String, Principal>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for `principal` and return its token.
    pub async fn create(&self, principal: Principal) -> BoardResult<String> {
        let mut bytes = [0u8; TOKEN_LEN];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| BoardError::Crypto("system random source unavailable".to_string()))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.sessions.write().await.insert(token.clone(), principal);
        Ok(token)
    }

    pub async fn principal(&self, token: &str) -> Option<Principal> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Returns whether a session existed.
    pub async fn destroy(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}
