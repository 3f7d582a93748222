//! The main config document and its collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{CollectionKind, Record};

/// Keyed records of one kind, ordered by key.
pub type Collection = BTreeMap<String, Record>;

/// The persisted root object.
///
/// Collections missing from a loaded file start out empty. Top-level keys
/// this crate does not know about are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    email_configurations: Record,
    #[serde(default)]
    rssfeeds: Collection,
    #[serde(default)]
    subscriptions: Collection,
    #[serde(default)]
    cookies: Collection,
    #[serde(default)]
    email_messages: Collection,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Document {
    /// An empty document with all five collections present.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document from a JSON value.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        if !value.is_object() {
            return Err(ConfigError::InvalidFormat(
                "config document must be an object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Encode the document as a JSON value.
    pub fn to_value(&self) -> ConfigResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// A keyed collection, or `None` for `email_configurations`.
    pub fn collection(&self, kind: CollectionKind) -> Option<&Collection> {
        match kind {
            CollectionKind::RssFeeds => Some(&self.rssfeeds),
            CollectionKind::Subscriptions => Some(&self.subscriptions),
            CollectionKind::EmailMessages => Some(&self.email_messages),
            CollectionKind::Cookies => Some(&self.cookies),
            CollectionKind::EmailConfigurations => None,
        }
    }

    /// Mutable access to a keyed collection.
    pub fn collection_mut(&mut self, kind: CollectionKind) -> Option<&mut Collection> {
        match kind {
            CollectionKind::RssFeeds => Some(&mut self.rssfeeds),
            CollectionKind::Subscriptions => Some(&mut self.subscriptions),
            CollectionKind::EmailMessages => Some(&mut self.email_messages),
            CollectionKind::Cookies => Some(&mut self.cookies),
            CollectionKind::EmailConfigurations => None,
        }
    }

    /// The flat email server settings record.
    pub fn email_configurations(&self) -> &Record {
        &self.email_configurations
    }

    pub fn email_configurations_mut(&mut self) -> &mut Record {
        &mut self.email_configurations
    }

    /// Look up a record by collection and key.
    pub fn record(&self, kind: CollectionKind, key: &str) -> Option<&Record> {
        self.collection(kind)?.get(key)
    }

    /// Top-level entries that are not one of the five collections.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}
