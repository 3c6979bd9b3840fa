/// Password Hashing and Verification
///
/// bcrypt with a fixed cost. Every call to `hash_password` picks a fresh salt,
/// so hashing the same password twice yields different strings.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};
use crate::validators::MAX_PASSWORD_BYTES;

/// bcrypt work factor.
pub const HASH_COST: u32 = 10;

/// Hash a password using bcrypt
///
/// # Errors
/// - Validation error for passwords over 72 bytes, which bcrypt would
///   silently truncate
/// - Internal error if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooManyBytes("password".to_string(), MAX_PASSWORD_BYTES).into());
    }
    hash(password, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// A wrong password is `Ok(false)`. An error means the stored hash is
/// malformed, which points at corrupted data rather than a bad login.
///
/// bcrypt recomputes the full hash before comparing, so the time taken does
/// not depend on how early the candidate diverges.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    // Nothing longer was ever hashed, and bcrypt would only compare a prefix.
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// [`hash_password`] on the blocking pool so bcrypt's work does not stall
/// the async worker.
pub async fn hash_password_async(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}
