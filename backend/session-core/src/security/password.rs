//! Password hashing and verification using Argon2id
use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a secret using Argon2id with a random per-secret salt
///
/// Returns a PHC-formatted hash string safe for database storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a secret against its PHC-formatted hash
///
/// Returns `true` on match, `false` on mismatch. Uses constant-time
/// comparison internally.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let password = "correct horse battery staple";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(verify_password(password, &hash).expect("should verify successfully"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let password = "correct horse battery staple";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(!verify_password("wrong horse", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_hash_never_stores_plaintext() {
        let password = "correct horse battery staple";
        let hash = hash_password(password).expect("should hash successfully");
        assert_ne!(hash, password);
        assert!(!hash.contains(password));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "correct horse battery staple";
        let hash1 = hash_password(password).expect("should hash successfully");
        let hash2 = hash_password(password).expect("should hash successfully");
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let result = verify_password("anything", "not-a-phc-hash");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }
}
