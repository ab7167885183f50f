//! Credential verification
//!
//! Argon2id password hashing with a cryptographically random salt. Hashes
//! are stored as PHC strings so algorithm parameters and salt travel with
//! the digest. A mismatch is a boolean outcome, never an error; only
//! hashing-backend failures surface as errors.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::AppError;

/// Hash a plaintext password
///
/// CPU-heavy; call through `tokio::task::spawn_blocking` from async code.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash
///
/// # Returns
/// `Ok(true)` on match, `Ok(false)` on mismatch. A malformed stored hash or
/// backend failure is an error for the calling request.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| AppError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Hashing(e.to_string())),
    }
}

/// Validate that a password meets the minimum length requirement.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), AppError> {
    if password.len() < min_length {
        return Err(AppError::Validation(format!(
            "Password must be at least {min_length} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");

        assert!(
            hash.starts_with("$argon2id$"),
            "expected argon2id PHC prefix"
        );

        let verified = verify_password(password, &hash).expect("verify should succeed");
        assert!(verified, "correct password should verify as true");
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let hash = hash_password("real-password").expect("hashing should succeed");
        let verified = verify_password("wrong-password", &hash).expect("verify should succeed");
        assert!(!verified, "wrong password should verify as false");
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Hashing(_))));
    }

    #[test]
    fn test_password_too_short() {
        let result = validate_password_strength("short", 6);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_password_meets_minimum() {
        assert!(validate_password_strength("sixsix", 6).is_ok());
        assert!(validate_password_strength("a-much-longer-password", 6).is_ok());
    }
}
