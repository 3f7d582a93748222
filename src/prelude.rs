//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use yarss_config::prelude::*;
//!
//! let mut store = ConfigStore::open(MemoryStorage::new())?;
//! store.save_record(CollectionKind::Cookies, fresh_cookie())?;
//! ```

pub use crate::document::{Collection, Document};
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::format::DocumentFormat;
pub use crate::schema::{
    fresh_cookie, fresh_email_configurations, fresh_email_message, fresh_rssfeed,
    fresh_subscription, CollectionKind, Record, RssFeedFields, SubscriptionFields,
};
pub use crate::storage::{DocumentStorage, FileStorage, MemoryStorage};
pub use crate::store::{Change, ConfigStore};
pub use crate::verify::VerificationReport;
