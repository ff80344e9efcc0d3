//! Argon2id credentials.
//!
//! Stored hashes are PHC strings, so the salt and cost parameters travel with
//! each hash and old rows keep verifying if the defaults change.

use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hash `secret` under a fresh random salt.
pub fn hash(secret: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash password: {e}"))?;
    Ok(phc.to_string())
}

/// `Ok(false)` on a mismatch. Errors only when `stored` is not a usable PHC
/// string, which means the row is corrupt rather than the login wrong.
pub fn verify(secret: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        anyhow!("parse stored password hash: {e}")
    })?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("verify password: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_verifies() {
        let stored = hash("green-miles-42").unwrap();
        assert!(verify("green-miles-42", &stored).unwrap());
    }

    #[test]
    fn other_secret_is_a_mismatch_not_an_error() {
        let stored = hash("correct-horse").unwrap();
        assert!(!verify("wrong-horse", &stored).unwrap());
        assert!(!verify("", &stored).unwrap());
    }

    #[test]
    fn same_secret_hashes_differently() {
        let a = hash("carpool").unwrap();
        let b = hash("carpool").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("carpool"));
    }

    #[test]
    fn corrupt_stored_hash_is_an_error() {
        let err = verify("anything", "plaintext-left-in-db").unwrap_err();
        assert!(err.to_string().starts_with("parse stored password hash"));
    }
}
