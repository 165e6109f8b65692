use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{CredentialVerifier, Principal};
use crate::error::{BoardError, BoardResult};
use crate::storage::models::UserRecord;
use crate::storage::{DocumentBackend, JsonCollection};

/// The persisted username → password verifier mapping.
pub struct CredentialStore {
    users: JsonCollection<UserRecord>,
    verifier: Arc<dyn CredentialVerifier>,
    /// Compared against when the username is unknown, so a miss costs as much as a hit.
    decoy: OnceCell<String>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn DocumentBackend>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            users: JsonCollection::new(backend),
            verifier,
            decoy: OnceCell::new(),
        }
    }

    /// Register a new account. Usernames are matched exactly, case included.
    pub async fn register(&self, username: &str, password: &str) -> BoardResult<()> {
        // Cheap early rejection before paying for the hash
        if self.find(username).await?.is_some() {
            return Err(BoardError::UsernameTaken(username.to_string()));
        }

        let password_verifier = self.hash(password).await?;

        let mut txn = self.users.begin().await?;
        if txn.items().iter().any(|u| u.username == username) {
            return Err(BoardError::UsernameTaken(username.to_string()));
        }
        txn.items_mut().push(UserRecord {
            username: username.to_string(),
            password_verifier,
        });
        txn.commit().await?;

        tracing::debug!(username = %username, "Registered user");
        Ok(())
    }

    pub async fn verify(&self, username: &str, password: &str) -> BoardResult<Principal> {
        let (user, stored) = match self.find(username).await? {
            Some(user) => {
                let stored = user.password_verifier.clone();
                (Some(user), stored)
            }
            None => (None, self.decoy().await?.to_string()),
        };

        let verifier = Arc::clone(&self.verifier);
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verifier.matches(&password, &stored))
            .await
            .map_err(|e| BoardError::Crypto(e.to_string()))?;

        match user {
            Some(user) if matches => Ok(Principal::new(user.username)),
            _ => Err(BoardError::InvalidCredentials),
        }
    }

    async fn find(&self, username: &str) -> BoardResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    async fn decoy(&self) -> BoardResult<&str> {
        let decoy = self
            .decoy
            .get_or_try_init(|| self.hash("decoy password for unknown users"))
            .await?;
        Ok(decoy.as_str())
    }

    async fn hash(&self, password: &str) -> BoardResult<String> {
        let verifier = Arc::clone(&self.verifier);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| BoardError::Crypto(e.to_string()))?
    }
}
