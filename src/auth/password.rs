// Password hashing and verification service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::warn;

use crate::error::ApiError;

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    /// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password service for hashing and verification
///
/// Hashes are PHC strings, so each one carries its own salt and cost
/// parameters and verification needs nothing else.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordService {
    /// Build a service with the given work factor
    pub fn new(config: HashingConfig) -> Result<Self, ApiError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ApiError::Internal(format!("invalid argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut service = Self {
            argon2,
            dummy_hash: String::new(),
        };
        service.dummy_hash = service.hash_password("dummy password for timing")?;
        Ok(service)
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash
    ///
    /// Unparseable hashes fail closed.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn the same amount of work as a real verification
    ///
    /// Used when the user does not exist so the response time does not
    /// reveal it.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify_password(password, &self.dummy_hash);
        false
    }

    /// `hash_password` on the blocking pool
    pub async fn hash_password_async(&self, password: String) -> Result<String, ApiError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash_password(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))?
    }

    /// `verify_password` on the blocking pool. A failed task counts as a mismatch.
    pub async fn verify_password_async(&self, password: String, hash: Option<String>) -> bool {
        let service = self.clone();
        let outcome = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => service.verify_password(&password, &hash),
            None => service.verify_dummy(&password),
        })
        .await;

        match outcome {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Password verification task failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn fast_config() -> HashingConfig {
    HashingConfig {
        memory_kib: Params::MIN_M_COST,
        iterations: Params::MIN_T_COST,
        parallelism: Params::MIN_P_COST,
    }
}
