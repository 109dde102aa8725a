use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

use crate::error::TokenError;

/// Length of secrets produced by [`generate_secret`] when no length is given
pub const DEFAULT_SECRET_LENGTH: usize = 32;

/// Resolves the signing secret for a token operation.
///
/// The first non-empty override wins; otherwise the configured default is
/// used. Resolution fails with [`TokenError::EmptySecret`] when neither is
/// available.
#[derive(Clone, Default)]
pub struct SecretResolver {
    default_secret: String,
}

impl SecretResolver {
    pub fn new(default_secret: impl Into<String>) -> Self {
        Self {
            default_secret: default_secret.into(),
        }
    }

    /// Resolve the secret, preferring the first non-empty override
    pub fn resolve(&self, overrides: &[&str]) -> Result<String, TokenError> {
        let secret = overrides
            .iter()
            .find(|s| !s.is_empty())
            .copied()
            .unwrap_or(self.default_secret.as_str());

        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(secret.to_string())
    }

    pub fn has_default(&self) -> bool {
        !self.default_secret.is_empty()
    }
}

impl fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResolver")
            .field("default_secret", &"<redacted>")
            .finish()
    }
}

/// Generate a random alphanumeric secret suitable for `jwt.secret`
pub fn generate_secret(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
