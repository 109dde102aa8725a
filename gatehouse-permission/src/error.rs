use thiserror::Error;

/// Errors raised while loading or compiling a permission catalogue
#[derive(Error, Debug)]
pub enum PermissionError {
    /// A configured default platform is not one of the recognized codes.
    /// Fatal at startup.
    #[error("platform configuration failed: unsupported platform code {0}")]
    InvalidPlatformConfig(u16),

    /// A definition has an empty code segment
    #[error("permission under `{0}` has an empty code")]
    EmptyCode(String),

    #[error("I/O error while reading permissions: {0}")]
    IOError(String),

    #[error("failed to parse permissions: {0}")]
    ParseError(String),

    #[error("unsupported permission file format: {0}")]
    UnsupportedFormat(String),
}

impl From<std::io::Error> for PermissionError {
    fn from(error: std::io::Error) -> Self {
        PermissionError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for PermissionError {
    fn from(error: serde_json::Error) -> Self {
        PermissionError::ParseError(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for PermissionError {
    fn from(error: toml::de::Error) -> Self {
        PermissionError::ParseError(error.to_string())
    }
}
