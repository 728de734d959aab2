//! Argon2id password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

use crate::{ResultService, ServiceError};

/// Hashes a password into a PHC string (salt included).
pub fn hash(password: &str) -> ResultService<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
pub fn verify(password: &str, stored_hash: &str) -> ResultService<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| ServiceError::Internal(format!("stored password hash invalid: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash("hunter2hunter2").unwrap();
        assert!(verify("hunter2hunter2", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("same password").unwrap();
        let b = hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_stored_hash_is_an_internal_error() {
        match verify("whatever", "not-a-phc-string") {
            Err(ServiceError::Internal(_)) => {}
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}
