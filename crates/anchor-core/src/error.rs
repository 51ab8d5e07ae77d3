use thiserror::Error;

/// Top-level error type for Anchor.
///
/// Subsystem crates keep their own error enums; this one covers the shared
/// concerns (configuration, I/O, serialization) and is what the binary
/// bubbles up at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnchorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<toml::de::Error> for AnchorError {
    fn from(err: toml::de::Error) -> Self {
        AnchorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AnchorError {
    fn from(err: toml::ser::Error) -> Self {
        AnchorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AnchorError {
    fn from(err: serde_json::Error) -> Self {
        AnchorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Anchor operations.
pub type Result<T> = std::result::Result<T, AnchorError>;
