use thiserror::Error;

/// Errors returned by a [`crate::RevocationStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The round-trip did not finish before its deadline
    #[error("store operation timed out")]
    Timeout,

    /// The key holds a value of another kind (string vs hash)
    #[error("wrong value type stored under `{0}`")]
    WrongType(String),

    #[error("invalid expire time for `{0}`")]
    InvalidExpire(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Generic(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn generic(message: impl Into<String>) -> Self {
        StoreError::Generic(message.into())
    }
}
