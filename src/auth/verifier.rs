use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

use crate::error::{BoardError, BoardResult};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

/// One-way password verifier. Implementations are expected to be slow.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> BoardResult<String>;
    fn matches(&self, password: &str, verifier: &str) -> bool;
}

/// Salted PBKDF2-HMAC-SHA256.
///
/// Verifiers are encoded as `pbkdf2-sha256$<iterations>$<salt>$<hash>` so that
/// changing the configured iteration count keeps existing accounts valid.
pub struct Pbkdf2Verifier {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Pbkdf2Verifier {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }
}

impl CredentialVerifier for Pbkdf2Verifier {
    fn hash(&self, password: &str) -> BoardResult<String> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| BoardError::Crypto("system random source unavailable".to_string()))?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(hash)
        ))
    }

    fn matches(&self, password: &str, verifier: &str) -> bool {
        let mut parts = verifier.split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };

        let Ok(iterations) = iterations.parse::<NonZeroU32>() else {
            return false;
        };
        let (Ok(salt), Ok(hash)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash))
        else {
            return false;
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &hash,
        )
        .is_ok()
    }
}
