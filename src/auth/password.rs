/// Password Hashing and Verification
///
/// Argon2id with per-password random salts. A fast digest is fine for
/// refresh tokens at rest (they are high-entropy), but passwords need a
/// slow, salted, memory-hard hash; verification is constant-time via the
/// PHC verifier.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC-format digest.
///
/// # Errors
/// Returns error if the stored digest is not parseable.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| AppError::Internal(format!("Stored password digest unreadable: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
