//! Password hashing
//!
//! Argon2id with a per-password random salt, stored as a PHC string.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{Error, Result};

/// Password hashing algorithm
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id hasher
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Option<Params>,
}

impl Argon2Hasher {
    /// Hasher with the library's recommended cost
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal-cost hasher for tests and local development
    pub fn low_cost() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, 1, 1, None).ok(),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        match &self.params {
            Some(params) => Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()),
            None => Argon2::default(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::PasswordHash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
        // Parameters are read from the PHC string, so any cost verifies
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Short, non-secret identifier of a stored hash
///
/// The salt of the PHC string. Every new hash gets a fresh salt, so the
/// fingerprint changes whenever the password is set, even to the same value.
pub fn credential_fingerprint(hash: &str) -> Result<String> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    parsed
        .salt
        .map(|salt| salt.as_str().to_string())
        .ok_or_else(|| Error::PasswordHash("hash has no salt".to_string()))
}

/// Runs a [`PasswordHasher`] off the async executor
#[derive(Clone)]
pub struct Passwords {
    hasher: Arc<dyn PasswordHasher>,
}

impl Passwords {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { hasher }
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Other(format!("Password hashing task failed: {e}")))?
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Other(format!("Password verification task failed: {e}")))?
    }
}

impl Default for Passwords {
    fn default() -> Self {
        Self::new(Arc::new(Argon2Hasher::new()))
    }
}
