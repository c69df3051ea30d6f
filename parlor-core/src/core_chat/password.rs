//! Salted password hashing for private channels.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::error::{ChatError, ChatResult};

/// Hashes a channel password into a PHC-format string.
pub fn hash_password(password: &str) -> ChatResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ChatError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

/// Checks a password attempt against a stored PHC-format hash.
pub fn verify_password(password: &str, stored_hash: &str) -> ChatResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ChatError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
