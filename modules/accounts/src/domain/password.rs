//! Argon2id password hashing.

use argon2::{
    password_hash::{PasswordHash, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version,
};

use crate::config::HashingConfig;
use crate::contract::model::User;
use crate::domain::error::DomainError;

/// Produces PHC-format hashes with the configured cost parameters.
///
/// Hashing is CPU and memory bound (19 MiB, 2 passes by default); async
/// callers go through [`PasswordHasher::hash_blocking`] and
/// [`verify_blocking`] so tokio workers are not stalled.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(cfg: &HashingConfig) -> Result<Self, DomainError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| DomainError::hashing(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| DomainError::hashing(e.to_string()))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DomainError::hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// [`PasswordHasher::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, password: &str) -> Result<String, DomainError> {
        let hasher = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::hashing(format!("hashing task failed: {e}")))?
    }
}

/// Constant-time check of `password` against a stored PHC string.
/// Cost parameters come from the hash itself, so older hashes keep verifying
/// after the configured parameters change.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`verify_password`] on the blocking thread pool.
pub async fn verify_blocking(password: &str, phc: &str) -> Result<bool, DomainError> {
    let password = password.to_owned();
    let phc = phc.to_owned();
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| DomainError::hashing(format!("verification task failed: {e}")))
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}
