//! Error type for configuration store operations.
//!
//! Every fallible operation in the crate returns [`ConfigError`]. Argument
//! errors are raised before anything is mutated; storage errors are returned
//! as-is and never retried.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, verifying or mutating the config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Wrong collection name, malformed record, missing key or unconfirmed delete.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading or writing the persisted document failed.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// The document decoded but does not have the expected shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// A [`Result`] type alias using [`ConfigError`].
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an [`ConfigError::InvalidArgument`] from a message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the caller passed an invalid argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if this is a storage I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
