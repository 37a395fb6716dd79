//! Argon2 password hashing

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use super::AuthError;

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Whether `password` matches a stored PHC hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub fn verify_password(hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hashing is CPU-bound; run it off the async workers
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
}

pub async fn verify_password_blocking(hash: String, password: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("abcdefg1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "abcdefg1").unwrap());
        assert!(!verify_password(&hash, "abcdefg2").unwrap());
    }

    #[test]
    fn salted() {
        assert_ne!(hash_password("abcdefg1").unwrap(), hash_password("abcdefg1").unwrap());
    }

    #[test]
    fn garbage_hash_is_error() {
        assert!(verify_password("not-a-phc-string", "abcdefg1").is_err());
    }
}
