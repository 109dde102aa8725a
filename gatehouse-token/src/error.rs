use thiserror::Error;

use crate::claims::Claims;

/// Errors produced while building, signing or decoding a token
#[derive(Error, Debug)]
pub enum TokenError {
    /// Neither an override nor the configured default secret is available
    #[error("signing secret cannot be empty")]
    EmptySecret,

    /// A mandatory claim is missing or inconsistent
    #[error("invalid claims: `{field}` {reason}")]
    InvalidClaims { field: &'static str, reason: String },

    /// The token could not be split, decoded or parsed
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The MAC did not verify against the resolved secret
    #[error("token signature is invalid")]
    BadSignature,

    /// `exp` has passed. The decoded claims are kept so that refresh can be
    /// driven from an expired token.
    #[error("token has expired")]
    Expired { claims: Box<Claims> },

    /// `nbf` is still in the future
    #[error("token is not valid yet")]
    NotYetValid,

    /// The issuer does not belong to this deployment, or the token is used
    /// before its validity window
    #[error("token used before issued")]
    IssuedBeforeValid,

    #[error("{0}")]
    Generic(String),
}

impl TokenError {
    pub fn malformed(message: impl Into<String>) -> Self {
        TokenError::MalformedToken(message.into())
    }

    pub fn invalid_claims(field: &'static str, reason: impl Into<String>) -> Self {
        TokenError::InvalidClaims {
            field,
            reason: reason.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        TokenError::Generic(message.into())
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }

    /// Claims carried by an [`TokenError::Expired`] error
    pub fn expired_claims(&self) -> Option<&Claims> {
        match self {
            TokenError::Expired { claims } => Some(claims),
            _ => None,
        }
    }

    /// Consume the error and take the claims of an expired token
    pub fn into_expired_claims(self) -> Option<Claims> {
        match self {
            TokenError::Expired { claims } => Some(*claims),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match error.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::MalformedToken(error.to_string()),
            _ => TokenError::Generic(error.to_string()),
        }
    }
}
