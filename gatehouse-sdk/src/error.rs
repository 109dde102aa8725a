use gatehouse_config::ConfigError;
use gatehouse_permission::PermissionError;
use gatehouse_store::StoreError;
use gatehouse_token::TokenError;
use thiserror::Error;

/// Why a refresh could not produce a token
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("token is not refreshable")]
    NotRefreshable,

    /// The published refresh record is older than the leeway allows. The
    /// caller must authenticate again.
    #[error("refresh window exceeded: record is {elapsed}s old, leeway is {leeway}s")]
    WindowExceeded { elapsed: i64, leeway: i64 },

    /// The refresh record write was not confirmed
    #[error("failed to persist the refresh record: {0}")]
    PersistFailed(String),

    #[error("refresh record is unreadable: {0}")]
    CorruptRecord(String),
}

/// Errors that can occur in the Gatehouse SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Permission catalogue error
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    /// Token error
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Refresh error
    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),

    /// Revocation store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The token id is on the blacklist
    #[error("token has been revoked")]
    Revoked,

    /// Password hashing error
    #[error("Password error: {0}")]
    Password(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

/// Coarse classification of failures, used to pick the response signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal at startup
    Config,
    /// Malformed or incomplete claims at issuance
    Claims,
    /// Bad signature, not yet valid, foreign issuer or revoked
    TokenInvalid,
    /// Past expiry, possibly refreshable
    TokenExpired,
    RefreshFailed,
    StoreUnavailable,
    Password,
    Internal,
}

impl ErrorKind {
    /// Whether the request should be answered with the uniform unauthorized
    /// signal
    pub fn is_unauthorized(self) -> bool {
        matches!(
            self,
            ErrorKind::TokenInvalid
                | ErrorKind::TokenExpired
                | ErrorKind::RefreshFailed
                | ErrorKind::StoreUnavailable
        )
    }
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Config(_) | SdkError::Permission(_) => ErrorKind::Config,
            SdkError::Token(error) => match error {
                TokenError::EmptySecret => ErrorKind::Config,
                TokenError::InvalidClaims { .. } => ErrorKind::Claims,
                TokenError::MalformedToken(_)
                | TokenError::BadSignature
                | TokenError::NotYetValid
                | TokenError::IssuedBeforeValid => ErrorKind::TokenInvalid,
                TokenError::Expired { .. } => ErrorKind::TokenExpired,
                TokenError::Generic(_) => ErrorKind::Internal,
            },
            SdkError::Refresh(_) => ErrorKind::RefreshFailed,
            SdkError::Store(_) => ErrorKind::StoreUnavailable,
            SdkError::Revoked => ErrorKind::TokenInvalid,
            SdkError::Password(_) => ErrorKind::Password,
            SdkError::Json(_) | SdkError::Generic(_) => ErrorKind::Internal,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind().is_unauthorized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            SdkError::from(TokenError::BadSignature).kind(),
            ErrorKind::TokenInvalid
        );
        assert_eq!(
            SdkError::from(TokenError::invalid_claims("sub", "cannot be empty")).kind(),
            ErrorKind::Claims
        );
        assert_eq!(
            SdkError::from(TokenError::EmptySecret).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            SdkError::from(ConfigError::KeyCollision("role".to_string())).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            SdkError::from(PermissionError::InvalidPlatformConfig(3)).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            SdkError::from(RefreshError::PersistFailed("timeout".to_string())).kind(),
            ErrorKind::RefreshFailed
        );
        assert_eq!(
            SdkError::from(StoreError::Timeout).kind(),
            ErrorKind::StoreUnavailable
        );
    }

    #[test]
    fn test_unauthorized_signal() {
        assert!(SdkError::Revoked.is_unauthorized());
        assert!(SdkError::from(StoreError::Timeout).is_unauthorized());
        assert!(!SdkError::from(TokenError::invalid_claims("iss", "cannot be empty")).is_unauthorized());
        assert!(!SdkError::Password("bad cost".to_string()).is_unauthorized());
    }
}
