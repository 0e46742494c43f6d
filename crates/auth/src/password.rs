//! Password hashing (Argon2id, PHC string format).
//!
//! New hashes are always Argon2id. Verification also accepts the bcrypt
//! (`$2a$`/`$2b$`/`$2y$`) hashes already present in existing user tables.
//!
//! Both functions are CPU-bound; async callers run them on the blocking pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Verify `password` against a stored Argon2 PHC or bcrypt hash.
///
/// Both backends compare digests in constant time.
pub fn verify_password(hash: &str, password: &str) -> Result<bool, PasswordError> {
    if BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p)) {
        return bcrypt::verify(password, hash).map_err(|e| PasswordError::MalformedHash(e.to_string()));
    }

    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
