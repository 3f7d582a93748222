//! Text encodings of the config document.
//!
//! The host writes its config files as a small JSON version header followed
//! by the JSON body. Plain JSON and TOML are also supported for standalone
//! use.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::document::Document;
use crate::error::{ConfigError, ConfigResult};

/// Version header written in front of the body in [`DocumentFormat::Versioned`].
const FILE_VERSION: u64 = 1;
const FORMAT_VERSION: u64 = 1;

/// On-disk encoding of the config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// A single pretty-printed JSON object.
    Json,
    /// A TOML table.
    Toml,
    /// Host layout: `{"file": 1, "format": 1}` followed by the JSON body.
    #[default]
    Versioned,
}

impl DocumentFormat {
    /// Pick the format from a file extension. `.json` and `.toml` map to
    /// their formats; anything else (e.g. `yarss2.conf`) is the host layout.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Versioned,
        }
    }

    /// Encode a document to text.
    pub fn encode(self, document: &Document) -> ConfigResult<String> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(document)?),
            Self::Toml => Ok(toml::to_string_pretty(document)?),
            Self::Versioned => {
                let header = json!({"file": FILE_VERSION, "format": FORMAT_VERSION});
                let mut out = serde_json::to_string_pretty(&header)?;
                out.push_str(&serde_json::to_string_pretty(document)?);
                Ok(out)
            }
        }
    }

    /// Decode a document from text. Blank input is an empty document.
    pub fn decode(self, text: &str) -> ConfigResult<Document> {
        if text.trim().is_empty() {
            return Ok(Document::new());
        }
        match self {
            Self::Json => Document::from_value(serde_json::from_str(text)?),
            Self::Toml => Ok(toml::from_str(text)?),
            Self::Versioned => decode_versioned(text),
        }
    }
}

fn decode_versioned(text: &str) -> ConfigResult<Document> {
    let objects = serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()?;

    let found = objects.len();
    let mut objects = objects.into_iter();
    match (objects.next(), objects.next(), objects.next()) {
        // A header written without a body yet
        (Some(header), None, None) if is_header(&header) => Ok(Document::new()),
        // Older files carry no header
        (Some(body), None, None) => Document::from_value(body),
        (Some(header), Some(body), None) => {
            if !is_header(&header) {
                return Err(ConfigError::InvalidFormat(
                    "version header is missing the 'file' field".to_string(),
                ));
            }
            Document::from_value(body)
        }
        _ => Err(ConfigError::InvalidFormat(format!(
            "expected a version header and a body object, found {} objects",
            found
        ))),
    }
}

fn is_header(value: &Value) -> bool {
    value.get("file").and_then(Value::as_u64).is_some()
}
