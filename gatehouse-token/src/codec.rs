use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::debug;

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::error::TokenError;
use crate::secret::SecretResolver;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies compact HS256 JWTs.
///
/// The validity window is checked against the injected [`Clock`] rather than
/// by `jsonwebtoken`, so an expired token still yields its claims.
///
/// # Example
///
/// ```
/// use gatehouse_token::{Claims, SecretResolver, TokenCodec};
///
/// # fn main() -> Result<(), gatehouse_token::TokenError> {
/// let codec = TokenCodec::new(SecretResolver::new("s3cret"));
/// let now = chrono::Utc::now().timestamp();
/// let claims = Claims::builder("app:api", "u1").window(now, 3600).build()?;
///
/// let token = codec.encode(&claims)?;
/// let decoded = codec.decode(&token)?;
/// assert_eq!(decoded.subject, "u1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secrets: SecretResolver,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secrets: SecretResolver) -> Self {
        Self::with_clock(secrets, Arc::new(SystemClock))
    }

    pub fn with_clock(secrets: SecretResolver, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["iss", "sub", "nbf", "exp"]);

        Self {
            secrets,
            clock,
            validation,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn secrets(&self) -> &SecretResolver {
        &self.secrets
    }

    /// Sign `claims` with the configured secret
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        self.encode_with(claims, &[])
    }

    /// Sign `claims`, preferring the first non-empty secret override.
    ///
    /// Claims are validated before signing and a token id is derived when the
    /// claims carry none, so two calls with the same logical input produce
    /// different tokens.
    pub fn encode_with(&self, claims: &Claims, secrets: &[&str]) -> Result<String, TokenError> {
        let secret = self.secrets.resolve(secrets)?;
        claims.validate()?;

        let mut claims = claims.clone();
        if claims.token_id.is_empty() {
            claims.token_id = claims.derive_token_id();
        }

        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::generic(format!("failed to sign token: {}", e)))
    }

    /// Verify and decode a token with the configured secret
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_with(token, &[])
    }

    /// Verify and decode a token, preferring the first non-empty secret
    /// override.
    ///
    /// # Errors
    ///
    /// - [`TokenError::MalformedToken`] if the structure cannot be parsed or
    ///   the header names another algorithm
    /// - [`TokenError::BadSignature`] if the MAC does not verify
    /// - [`TokenError::NotYetValid`] if `nbf` is in the future
    /// - [`TokenError::Expired`] if `exp` has passed; the error carries the
    ///   decoded claims
    pub fn decode_with(&self, token: &str, secrets: &[&str]) -> Result<Claims, TokenError> {
        let secret = self.secrets.resolve(secrets)?;
        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation,
        )?
        .claims;

        let now = self.clock.timestamp();
        if now < claims.not_before {
            debug!(jti = %claims.token_id, "token is not valid yet");
            return Err(TokenError::NotYetValid);
        }
        if now >= claims.expires_at {
            debug!(jti = %claims.token_id, "token has expired");
            return Err(TokenError::Expired {
                claims: Box::new(claims),
            });
        }

        Ok(claims)
    }
}
