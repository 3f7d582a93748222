//! Common test utilities and fixtures.

#![allow(dead_code)]

use serde_json::{json, Value};
use tempfile::TempDir;
use yarss_config::{CollectionKind, ConfigStore, Document, Record};

// =============================================================================
// Persisted documents
// =============================================================================

/// A config file written by an older plugin version: feeds lack `obey_ttl`,
/// subscriptions lack the paused-state and notification fields, and one
/// subscription has an integer key.
pub const LEGACY_CONFIG: &str = r#"{
  "file": 1,
  "format": 1
}{
  "rssfeeds": {
    "0": {
      "key": "0",
      "name": "Linux ISOs",
      "url": "http://example.com/linux.xml",
      "site": "example.com",
      "active": true,
      "last_update": "",
      "update_interval": 60
    }
  },
  "subscriptions": {
    "0": {
      "key": "0",
      "name": "Ubuntu",
      "rssfeed_key": "0",
      "regex_include": "ubuntu.*iso",
      "regex_include_ignorecase": true,
      "regex_exclude": "",
      "regex_exclude_ignorecase": true,
      "active": true,
      "last_update": "",
      "move_completed": "",
      "download_location": "",
      "custom_text_lines": ""
    },
    "1": {
      "key": 1,
      "name": "Debian",
      "rssfeed_key": "0",
      "regex_include": "debian",
      "active": "yes"
    }
  },
  "email_messages": {},
  "email_configurations": {
    "send_email_on_torrent_events": false,
    "smtp_server": "smtp.example.org",
    "smtp_port": 587
  },
  "cookies": {}
}"#;

// =============================================================================
// Test store on disk
// =============================================================================

/// A temporary directory holding a config file.
pub struct TestDir {
    pub dir: TempDir,
}

impl TestDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { dir: TempDir::new()? })
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` and open a store on it.
    pub fn open_with(&self, name: &str, contents: &str) -> anyhow::Result<ConfigStore> {
        std::fs::write(self.path(name), contents)?;
        Ok(ConfigStore::open_path(self.path(name))?)
    }
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// Fetch a record or fail the test.
pub fn record<'a>(
    document: &'a Document,
    kind: CollectionKind,
    key: &str,
) -> anyhow::Result<&'a Record> {
    document
        .record(kind, key)
        .ok_or_else(|| anyhow::anyhow!("no record '{}' in {}", key, kind))
}

/// Fetch a field of a record or fail the test.
pub fn field<'a>(
    document: &'a Document,
    kind: CollectionKind,
    key: &str,
    name: &str,
) -> anyhow::Result<&'a Value> {
    record(document, kind, key)?
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("record '{}' in {} has no field '{}'", key, kind, name))
}

/// Keys of a keyed collection, in order.
pub fn keys(document: &Document, kind: CollectionKind) -> Vec<String> {
    document
        .collection(kind)
        .map(|c| c.keys().cloned().collect())
        .unwrap_or_default()
}

/// The feed used by the end-to-end scenario.
pub fn example_feed() -> Value {
    json!({
        "name": "Example",
        "url": "http://example.com/feed",
        "site": "example.com",
        "update_interval": 120,
    })
}
