//! Salted one-way password hashing with bcrypt.

use crate::error::SdkError;

pub use bcrypt::DEFAULT_COST;

/// Hash `plaintext` at the default cost
pub fn hash(plaintext: &str) -> Result<String, SdkError> {
    hash_with_cost(plaintext, DEFAULT_COST)
}

pub fn hash_with_cost(plaintext: &str, cost: u32) -> Result<String, SdkError> {
    bcrypt::hash(plaintext, cost).map_err(|e| SdkError::Password(e.to_string()))
}

/// Whether `plaintext` matches `digest`. Malformed digests do not match.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}
