//! Store settings loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::format::DocumentFormat;

/// Where the config document lives and how to log.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Path of the persisted config document.
    pub path: PathBuf,
    /// Document encoding. Inferred from `path` when absent.
    #[serde(default)]
    pub format: Option<DocumentFormat>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StoreSettings {
    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::io(path.as_ref(), e))?;
        Self::from_str(&content)
    }

    /// Parse settings from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The configured format, or the one implied by the path extension.
    pub fn format(&self) -> DocumentFormat {
        self.format
            .unwrap_or_else(|| DocumentFormat::from_path(&self.path))
    }
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings for the bundled subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"yarss_config=debug"`.
    pub level: String,
    pub format: LogFormat,
    /// `"stdout"`, `"stderr"` or a file path to append to.
    pub output: String,
    pub color: bool,
    pub target: bool,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            output: "stderr".to_string(),
            color: true,
            target: true,
            timestamps: true,
        }
    }
}
