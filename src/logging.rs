//! Conditional logging macros for verification and CRUD diagnostics.
//!
//! With the `logging` feature these forward to `tracing`; without it they
//! expand to nothing, so the store has no logging dependency at all.
//!
//! ```rust,ignore
//! use crate::logging::{info, warn};
//!
//! info!(collection = "rssfeeds", field = "obey_ttl", "inserting missing config field");
//! warn!(field = "key", "identity field has the wrong type, must be fixed manually");
//! ```

/// Per-operation detail (save, delete, persist).
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Store lifecycle and inserted fields.
#[cfg(feature = "logging")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// Repaired values and identity mismatches.
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub(crate) use log_debug as debug;
pub(crate) use log_info as info;
pub(crate) use log_warn as warn;
