//! The config store engine.
//!
//! [`ConfigStore`] owns the main config document. Constructing one loads the
//! document and runs a verification pass, so every store a caller can hold
//! is already verified. After that, every mutation is written through to
//! storage before the call returns.

use std::path::Path;

use serde_json::Value;

use crate::document::{Collection, Document};
use crate::error::{ConfigError, ConfigResult};
use crate::logging::{debug, info};
use crate::schema::{CollectionKind, Record};
use crate::settings::StoreSettings;
use crate::storage::{DocumentStorage, FileStorage};
use crate::verify::{verify_document, verify_record, Location, VerificationReport, KEY_FIELD};

/// A mutation accepted by [`ConfigStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert (no `key` field) or update (with `key`) a record.
    Save(Value),
    /// Remove the record stored under `key`. `confirmed` must be set.
    Delete { key: String, confirmed: bool },
}

type Listener = Box<dyn Fn(&Document)>;

/// Verified, persisted configuration with generic CRUD over its collections.
pub struct ConfigStore {
    document: Document,
    storage: Box<dyn DocumentStorage>,
    report: VerificationReport,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("storage", &self.storage.describe())
            .field("document", &self.document)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ConfigStore {
    /// Load the document from storage (or start empty) and verify it.
    pub fn open(storage: impl DocumentStorage + 'static) -> ConfigResult<Self> {
        let document = storage.load()?;
        info!(
            storage = %storage.describe(),
            existing = document.is_some(),
            "opening config store"
        );
        Self::verified(document.unwrap_or_default(), Box::new(storage))
    }

    /// Open the document at `path`, using the format implied by its extension.
    pub fn open_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::open(FileStorage::new(path.as_ref()))
    }

    /// Open the document described by the settings file.
    pub fn from_settings(settings: &StoreSettings) -> ConfigResult<Self> {
        Self::open(FileStorage::with_format(&settings.path, settings.format()))
    }

    /// Use a caller-supplied document instead of loading one.
    pub fn with_document(
        document: Document,
        storage: impl DocumentStorage + 'static,
    ) -> ConfigResult<Self> {
        Self::verified(document, Box::new(storage))
    }

    fn verified(document: Document, storage: Box<dyn DocumentStorage>) -> ConfigResult<Self> {
        let mut store = Self {
            document,
            storage,
            report: VerificationReport::new(),
            listeners: Vec::new(),
        };
        store.report = store.verify()?;
        Ok(store)
    }

    /// Run a verification pass, persisting once if anything was repaired.
    pub fn verify(&mut self) -> ConfigResult<VerificationReport> {
        let report = verify_document(&mut self.document);
        if report.changed() {
            info!(changes = report.changes(), "saving repaired config");
            self.storage.save(&self.document)?;
        }
        Ok(report)
    }

    /// Report of the verification pass run at construction.
    pub fn verification_report(&self) -> &VerificationReport {
        &self.report
    }

    /// The live document.
    pub fn config(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the live document. Call [`ConfigStore::persist`]
    /// afterwards to write the changes.
    pub fn config_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Register a callback run after every persisted change.
    pub fn on_change(&mut self, listener: impl Fn(&Document) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Write the current document to storage.
    pub fn persist(&self) -> ConfigResult<()> {
        debug!(storage = %self.storage.describe(), "persisting config");
        self.storage.save(&self.document)?;
        self.notify();
        Ok(())
    }

    /// Apply a save or delete to the named collection.
    pub fn apply(&mut self, collection: &str, change: Change) -> ConfigResult<&Document> {
        let kind: CollectionKind = collection.parse()?;
        match change {
            Change::Save(record) => {
                let record = match record {
                    Value::Object(record) => record,
                    other => {
                        return Err(ConfigError::invalid_argument(format!(
                            "record for '{}' must be a dictionary: '{}'",
                            kind, other
                        )));
                    }
                };
                self.save_record(kind, record)?;
            }
            Change::Delete { key, confirmed } => {
                self.delete_record(kind, &key, confirmed)?;
            }
        }
        Ok(&self.document)
    }

    /// Save a record to the named collection and return the whole document.
    ///
    /// A record without a `key` field is stored under a newly assigned key.
    /// A record with one replaces the entry under that key.
    pub fn save(&mut self, collection: &str, record: Value) -> ConfigResult<&Document> {
        self.apply(collection, Change::Save(record))
    }

    /// Delete the record under `key`. Fails unless `confirmed` is set.
    pub fn delete(
        &mut self,
        collection: &str,
        key: &str,
        confirmed: bool,
    ) -> ConfigResult<&Document> {
        self.apply(
            collection,
            Change::Delete {
                key: key.to_string(),
                confirmed,
            },
        )
    }

    /// Typed save. Returns the record's key, or `None` for the flat
    /// `email_configurations` record.
    ///
    /// Missing template fields are filled in and mistyped ones reset before
    /// the record is stored.
    pub fn save_record(
        &mut self,
        kind: CollectionKind,
        mut record: Record,
    ) -> ConfigResult<Option<String>> {
        let Some(collection) = self.document.collection_mut(kind) else {
            let mut report = VerificationReport::new();
            verify_record(&mut record, &kind.template(), &Location::flat(kind), &mut report);
            debug!(collection = %kind, repaired = report.changes(), "saving settings record");

            let previous = std::mem::replace(self.document.email_configurations_mut(), record);
            if let Err(e) = self.storage.save(&self.document) {
                *self.document.email_configurations_mut() = previous;
                return Err(e);
            }
            self.notify();
            return Ok(None);
        };

        let key = match record.get(KEY_FIELD) {
            None => {
                let key = next_free_key(collection);
                record.insert(KEY_FIELD.to_string(), Value::String(key.clone()));
                key
            }
            Some(Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(ConfigError::invalid_argument(format!(
                    "record key for '{}' must be a string: '{}'",
                    kind, other
                )));
            }
        };

        let mut report = VerificationReport::new();
        verify_record(&mut record, &kind.template(), &Location::record(kind, &key), &mut report);
        debug!(collection = %kind, %key, repaired = report.changes(), "saving record");

        let previous = collection.insert(key.clone(), record);
        if let Err(e) = self.storage.save(&self.document) {
            if let Some(collection) = self.document.collection_mut(kind) {
                match previous {
                    Some(previous) => collection.insert(key, previous),
                    None => collection.remove(&key),
                };
            }
            return Err(e);
        }
        self.notify();
        Ok(Some(key))
    }

    /// Typed delete. Returns the removed record.
    pub fn delete_record(
        &mut self,
        kind: CollectionKind,
        key: &str,
        confirmed: bool,
    ) -> ConfigResult<Record> {
        if !confirmed {
            return Err(ConfigError::invalid_argument(
                "deleting an item requires confirmation",
            ));
        }
        let collection = self.document.collection_mut(kind).ok_or_else(|| {
            ConfigError::invalid_argument(format!("'{}' is not a keyed collection", kind))
        })?;
        let removed = collection.remove(key).ok_or_else(|| {
            ConfigError::invalid_argument(format!(
                "Invalid key - item with key '{}' doesn't exist in '{}'",
                key, kind
            ))
        })?;
        debug!(collection = %kind, %key, "deleting record");

        if let Err(e) = self.storage.save(&self.document) {
            if let Some(collection) = self.document.collection_mut(kind) {
                collection.insert(key.to_string(), removed);
            }
            return Err(e);
        }
        self.notify();
        Ok(removed)
    }

    /// Replace whole collections with the ones present in `update`.
    ///
    /// Collections not named in `update` are left as they are. Every entry is
    /// checked before anything is replaced.
    pub fn set_config(&mut self, update: Value) -> ConfigResult<&Document> {
        let Value::Object(update) = update else {
            return Err(ConfigError::invalid_argument(
                "config update must be a dictionary",
            ));
        };

        let mut staged = Vec::with_capacity(update.len());
        for (name, value) in update {
            let kind: CollectionKind = name.parse()?;
            let replacement = if kind.is_keyed() {
                let collection: Collection = serde_json::from_value(value).map_err(|e| {
                    ConfigError::invalid_argument(format!(
                        "'{}' must map keys to dictionaries: {}",
                        kind, e
                    ))
                })?;
                Replacement::Collection(collection)
            } else {
                match value {
                    Value::Object(record) => Replacement::Record(record),
                    other => {
                        return Err(ConfigError::invalid_argument(format!(
                            "'{}' must be a dictionary: '{}'",
                            kind, other
                        )));
                    }
                }
            };
            staged.push((kind, replacement));
        }

        let previous = self.document.clone();
        for (kind, replacement) in staged {
            match replacement {
                Replacement::Collection(collection) => {
                    if let Some(slot) = self.document.collection_mut(kind) {
                        *slot = collection;
                    }
                }
                Replacement::Record(record) => *self.document.email_configurations_mut() = record,
            }
        }
        debug!("replacing config collections");

        if let Err(e) = self.storage.save(&self.document) {
            self.document = previous;
            return Err(e);
        }
        self.notify();
        Ok(&self.document)
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.document);
        }
    }
}

enum Replacement {
    Collection(Collection),
    Record(Record),
}

/// The lowest non-negative integer, as a string, not used as a key.
fn next_free_key(collection: &Collection) -> String {
    let mut candidate: u64 = 0;
    loop {
        let key = candidate.to_string();
        if !collection.contains_key(&key) {
            return key;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl DocumentStorage for BrokenStorage {
        fn load(&self) -> ConfigResult<Option<Document>> {
            Ok(None)
        }

        fn save(&self, _document: &Document) -> ConfigResult<()> {
            Err(ConfigError::io(
                "/dev/full",
                std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"),
            ))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn empty_store() -> anyhow::Result<(ConfigStore, MemoryStorage)> {
        let storage = MemoryStorage::new();
        let store = ConfigStore::open(storage.clone())?;
        Ok((store, storage))
    }

    fn keys(store: &ConfigStore, kind: CollectionKind) -> Vec<String> {
        store
            .config()
            .collection(kind)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_next_free_key_fills_gaps() {
        let mut collection = Collection::new();
        assert_eq!(next_free_key(&collection), "0");
        collection.insert("0".into(), Record::new());
        collection.insert("2".into(), Record::new());
        assert_eq!(next_free_key(&collection), "1");
        collection.insert("1".into(), Record::new());
        assert_eq!(next_free_key(&collection), "3");
    }

    #[test]
    fn test_open_empty_fills_email_configurations() -> anyhow::Result<()> {
        let (store, storage) = empty_store()?;
        assert_eq!(store.config().email_configurations().len(), 10);
        assert!(store.verification_report().changed());
        assert_eq!(storage.saves(), 1);
        Ok(())
    }

    #[test]
    fn test_open_clean_document_does_not_persist() -> anyhow::Result<()> {
        let (store, _) = empty_store()?;
        let storage = MemoryStorage::with_document(store.config().clone());
        let reopened = ConfigStore::open(storage.clone())?;
        assert!(reopened.verification_report().is_empty());
        assert_eq!(storage.saves(), 0);
        Ok(())
    }

    #[test]
    fn test_save_assigns_key_and_defaults() -> anyhow::Result<()> {
        let (mut store, storage) = empty_store()?;
        let document = store.save("email_messages", json!({"name": "Done", "to_address": "me@x.org"}))?;

        let record = document
            .record(CollectionKind::EmailMessages, "0")
            .ok_or_else(|| anyhow::anyhow!("message not saved"))?;
        assert_eq!(record.get("key"), Some(&json!("0")));
        assert_eq!(record.get("active"), Some(&json!(true)));
        assert_eq!(record.get("subject"), Some(&json!("")));
        assert_eq!(storage.snapshot().as_ref(), Some(store.config()));
        Ok(())
    }

    #[test]
    fn test_save_with_key_updates_in_place() -> anyhow::Result<()> {
        let (mut store, _) = empty_store()?;
        store.save("cookies", json!({"site": "a.com"}))?;
        store.save("cookies", json!({"site": "b.com"}))?;
        store.save("cookies", json!({"key": "0", "site": "c.com", "active": false}))?;

        assert_eq!(keys(&store, CollectionKind::Cookies), vec!["0", "1"]);
        let first = store.config().record(CollectionKind::Cookies, "0");
        assert_eq!(first.and_then(|r| r.get("site")), Some(&json!("c.com")));
        assert_eq!(first.and_then(|r| r.get("active")), Some(&json!(false)));
        let second = store.config().record(CollectionKind::Cookies, "1");
        assert_eq!(second.and_then(|r| r.get("site")), Some(&json!("b.com")));
        Ok(())
    }

    #[test]
    fn test_save_rejects_bad_arguments() -> anyhow::Result<()> {
        let (mut store, storage) = empty_store()?;
        let before = store.config().clone();

        assert!(store.save("feeds", json!({})).is_err_and(|e| e.is_invalid_argument()));
        assert!(store.save("rssfeeds", json!("name")).is_err_and(|e| e.is_invalid_argument()));
        assert!(store.save("rssfeeds", Value::Null).is_err_and(|e| e.is_invalid_argument()));
        assert!(store
            .save("rssfeeds", json!({"key": 3}))
            .is_err_and(|e| e.is_invalid_argument()));

        assert_eq!(store.config(), &before);
        assert_eq!(storage.saves(), 1);
        Ok(())
    }

    #[test]
    fn test_delete_requires_confirmation_and_existing_key() -> anyhow::Result<()> {
        let (mut store, _) = empty_store()?;
        store.save("subscriptions", json!({"name": "Weekly"}))?;
        let before = store.config().clone();

        assert!(store
            .delete("subscriptions", "0", false)
            .is_err_and(|e| e.is_invalid_argument()));
        assert!(store
            .delete("subscriptions", "9", true)
            .is_err_and(|e| e.is_invalid_argument()));
        assert!(store
            .delete("email_configurations", "0", true)
            .is_err_and(|e| e.is_invalid_argument()));
        assert_eq!(store.config(), &before);

        store.delete("subscriptions", "0", true)?;
        assert!(keys(&store, CollectionKind::Subscriptions).is_empty());
        Ok(())
    }

    #[test]
    fn test_save_email_configurations_replaces_record() -> anyhow::Result<()> {
        let (mut store, _) = empty_store()?;
        let key = store.save_record(
            CollectionKind::EmailConfigurations,
            json!({"smtp_server": "smtp.example.org", "smtp_authentication": true})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        )?;
        assert_eq!(key, None);

        let settings = store.config().email_configurations();
        assert_eq!(settings.get("smtp_server"), Some(&json!("smtp.example.org")));
        assert_eq!(settings.get("smtp_authentication"), Some(&json!(true)));
        assert!(!settings.contains_key("key"));
        assert_eq!(settings.len(), 10);
        Ok(())
    }

    #[test]
    fn test_set_config_replaces_only_named_collections() -> anyhow::Result<()> {
        let (mut store, storage) = empty_store()?;
        store.save("rssfeeds", json!({"name": "Kept"}))?;
        store.save("cookies", json!({"site": "old.com"}))?;

        store.set_config(json!({"cookies": {"5": {"key": "5", "site": "new.com"}}}))?;

        assert_eq!(keys(&store, CollectionKind::Cookies), vec!["5"]);
        assert_eq!(keys(&store, CollectionKind::RssFeeds), vec!["0"]);
        assert_eq!(storage.snapshot().as_ref(), Some(store.config()));
        Ok(())
    }

    #[test]
    fn test_set_config_validates_before_mutating() -> anyhow::Result<()> {
        let (mut store, _) = empty_store()?;
        store.save("cookies", json!({"site": "old.com"}))?;
        let before = store.config().clone();

        let result = store.set_config(json!({
            "cookies": {},
            "rssfeeds": {"0": "not a record"},
        }));
        assert!(result.is_err_and(|e| e.is_invalid_argument()));
        assert!(store
            .set_config(json!({"cookies": {}, "unknown": {}}))
            .is_err_and(|e| e.is_invalid_argument()));
        assert!(store.set_config(json!([])).is_err_and(|e| e.is_invalid_argument()));
        assert_eq!(store.config(), &before);
        Ok(())
    }

    #[test]
    fn test_persist_after_direct_mutation() -> anyhow::Result<()> {
        let (mut store, storage) = empty_store()?;
        store
            .config_mut()
            .email_configurations_mut()
            .insert("from_address".into(), json!("yarss@example.org"));
        store.persist()?;

        let saved = storage.snapshot().ok_or_else(|| anyhow::anyhow!("nothing saved"))?;
        assert_eq!(
            saved.email_configurations().get("from_address"),
            Some(&json!("yarss@example.org"))
        );
        Ok(())
    }

    #[test]
    fn test_listeners_see_each_change() -> anyhow::Result<()> {
        let (mut store, _) = empty_store()?;
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.on_change(move |_| seen.set(seen.get() + 1));

        store.save("rssfeeds", json!({"name": "A"}))?;
        store.delete("rssfeeds", "0", true)?;
        let _ = store.delete("rssfeeds", "0", true);
        store.persist()?;
        assert_eq!(calls.get(), 3);
        Ok(())
    }

    #[test]
    fn test_failed_persist_rolls_back() -> anyhow::Result<()> {
        let mut store = ConfigStore::with_document(Document::new(), MemoryStorage::new())?;
        store.save("rssfeeds", json!({"name": "A"}))?;
        let before = store.config().clone();

        let mut broken = ConfigStore {
            document: before.clone(),
            storage: Box::new(BrokenStorage),
            report: VerificationReport::new(),
            listeners: Vec::new(),
        };
        assert!(broken.save("rssfeeds", json!({"name": "B"})).is_err_and(|e| e.is_io()));
        assert!(broken
            .save("rssfeeds", json!({"key": "0", "name": "C"}))
            .is_err_and(|e| e.is_io()));
        assert!(broken.delete("rssfeeds", "0", true).is_err_and(|e| e.is_io()));
        assert!(broken.set_config(json!({"rssfeeds": {}})).is_err_and(|e| e.is_io()));
        assert!(broken
            .save("email_configurations", json!({}))
            .is_err_and(|e| e.is_io()));
        assert_eq!(broken.config(), &before);
        Ok(())
    }

    #[test]
    fn test_open_propagates_storage_failure() {
        let mut document = Document::new();
        document
            .email_configurations_mut()
            .insert("smtp_port".into(), json!(25));
        assert!(ConfigStore::with_document(document, BrokenStorage).is_err_and(|e| e.is_io()));
    }
}
