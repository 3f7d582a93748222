//! The five named collections of the main config document.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

use super::Record;

/// A named collection in the main config.
///
/// Four kinds are keyed maps of records; `email_configurations` is a single
/// flat settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    RssFeeds,
    Subscriptions,
    EmailMessages,
    EmailConfigurations,
    Cookies,
}

impl CollectionKind {
    /// Every collection, in the order verification walks them.
    pub const ALL: [Self; 5] = [
        Self::Subscriptions,
        Self::RssFeeds,
        Self::EmailMessages,
        Self::Cookies,
        Self::EmailConfigurations,
    ];

    /// Name of the collection in the persisted document.
    pub const fn name(self) -> &'static str {
        match self {
            Self::RssFeeds => "rssfeeds",
            Self::Subscriptions => "subscriptions",
            Self::EmailMessages => "email_messages",
            Self::EmailConfigurations => "email_configurations",
            Self::Cookies => "cookies",
        }
    }

    /// Whether the collection maps keys to records (everything but the
    /// email settings record).
    pub const fn is_keyed(self) -> bool {
        !matches!(self, Self::EmailConfigurations)
    }

    /// The fresh template records of this kind are verified against.
    pub fn template(self) -> Record {
        super::template(self)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::invalid_argument(format!("Invalid config key: '{}'", s)))
    }
}
