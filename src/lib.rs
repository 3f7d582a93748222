//! Schema-verified configuration store for the YaRSS2 feed-subscription plugin.
//!
//! The plugin keeps its RSS feeds, subscriptions, email messages, email
//! server settings and per-site cookies in one persisted document. This
//! crate loads that document, repairs it against the current record
//! templates, and offers generic create/update/delete over its collections,
//! writing the document back after every change.
//!
//! # Quick Start
//!
//! ```ignore
//! use yarss_config::prelude::*;
//! use serde_json::json;
//!
//! let mut store = ConfigStore::open_path("yarss2.conf")?;
//!
//! // New records get a key assigned
//! let document = store.save("rssfeeds", json!({"name": "Example", "url": "http://example.com/feed"}))?;
//!
//! // Deleting needs an explicit confirmation
//! store.delete("rssfeeds", "0", true)?;
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Fresh record templates and the collection kinds
//! - [`document`] - The persisted document and its collections
//! - [`verify`] - Startup verification and repair
//! - [`store`] - The config store engine
//! - [`storage`] - File and in-memory document storage
//! - [`format`] - JSON, TOML and host document encodings
//! - [`settings`] - TOML store settings
//! - `subscriber` - Tracing subscriber setup (requires `subscriber` feature)
//!
//! # Feature Flags
//!
//! - `logging` - Enable library-level tracing (enabled by default)
//! - `subscriber` - Enable the bundled `tracing-subscriber` initializer
//! - `full` - Enable all features

pub mod document;
pub mod error;
pub mod format;
mod logging;
pub mod prelude;
pub mod schema;
pub mod settings;
pub mod storage;
pub mod store;
#[cfg(feature = "subscriber")]
pub mod subscriber;
pub mod verify;

pub use document::{Collection, Document};
pub use error::{ConfigError, ConfigResult};
pub use format::DocumentFormat;
pub use schema::{
    fresh_cookie, fresh_email_configurations, fresh_email_message, fresh_rssfeed,
    fresh_subscription, CollectionKind, FeedLocation, Record, RssFeedFields, SubscriptionFields,
    DEFAULT_UPDATE_INTERVAL,
};
pub use settings::{LogFormat, LoggingConfig, StoreSettings};
pub use storage::{DocumentStorage, FileStorage, MemoryStorage};
pub use store::{Change, ConfigStore};
pub use verify::{Finding, Location, ValueKind, VerificationReport};
