//! Password hashing
//!
//! One-way salted bcrypt hashing for local credentials. Stateless;
//! safe to call from any number of concurrent request handlers.

use crate::error::AppError;

/// Hash a plaintext password with bcrypt at the given cost.
///
/// The salt is generated per call by the bcrypt implementation.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(e.into()))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Delegates to bcrypt's own timing-safe comparison. Malformed hash
/// input yields `false` rather than an error; a record with a broken
/// hash must simply never authenticate.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the test suite fast; production uses DEFAULT_COST.
    const TEST_COST: u32 = 4;

    #[test]
    fn verify_accepts_matching_password() {
        let hashed = hash_password("correct horse battery staple", TEST_COST).unwrap();
        assert!(verify_password("correct horse battery staple", &hashed));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hashed = hash_password("password-one", TEST_COST).unwrap();
        assert!(!verify_password("password-two", &hashed));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same-password", TEST_COST).unwrap();
        let second = hash_password("same-password", TEST_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_returns_false_on_malformed_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", ""));
    }
}
