//! bcrypt password hashing.

use std::sync::OnceLock;

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::internal(anyhow!(e)))
}

/// Checks `password` against a stored bcrypt hash.
///
/// A mismatch is `Ok(false)`. Only a malformed hash is an error.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    verify(password, hashed).map_err(|e| AppError::internal(anyhow!(e)))
}

/// Burns the same bcrypt work as a real verification.
///
/// Called on login when the email is unknown so response timing does not
/// reveal which accounts exist.
pub fn dummy_verify(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash("schoolboard-timing-guard", DEFAULT_COST).ok());
    if let Some(dummy) = dummy {
        let _ = verify(password, dummy);
    }
}
