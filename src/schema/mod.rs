//! Schema registry: the canonical fresh shape of every record kind.
//!
//! These templates are used to build new records and, at startup, to verify
//! and repair records loaded from disk. Everything here is pure construction.

mod feed;
mod kind;

use serde_json::{Map, Value};

use crate::error::ConfigResult;

pub use feed::{FeedLocation, ALLOWED_FEED_SCHEMES};
pub use kind::CollectionKind;

/// A single config entry: field name to value.
pub type Record = Map<String, Value>;

/// Default feed polling interval, in minutes.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 120;

/// Default subject for notification emails.
pub const DEFAULT_EMAIL_SUBJECT: &str = "[YaRSS2]: RSS event";

/// Default body for notification emails. `$torrentlist` is substituted by
/// the notifier.
pub const DEFAULT_EMAIL_MESSAGE: &str = "Hi

The following torrents have been downloaded:

$torrentlist

Regards
";

/// Fields of a new RSS feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RssFeedFields {
    pub name: String,
    pub url: String,
    pub site: String,
    pub active: bool,
    pub last_update: String,
    pub update_interval: u64,
    pub obey_ttl: bool,
    /// Only written to the record when non-empty.
    pub key: Option<String>,
}

impl Default for RssFeedFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            site: String::new(),
            active: true,
            last_update: String::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            obey_ttl: false,
            key: None,
        }
    }
}

impl RssFeedFields {
    /// Feed fields with `url` normalized and `site` derived from it.
    pub fn for_url(name: impl Into<String>, url: &str) -> ConfigResult<Self> {
        let location = FeedLocation::parse(url)?;
        Ok(Self {
            name: name.into(),
            url: location.url,
            site: location.site,
            ..Self::default()
        })
    }
}

/// Fields of a new subscription entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionFields {
    pub name: String,
    pub rssfeed_key: String,
    pub regex_include: String,
    pub regex_exclude: String,
    pub active: bool,
    pub move_completed: String,
    pub download_location: String,
    pub last_update: String,
    pub key: Option<String>,
}

impl Default for SubscriptionFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            rssfeed_key: String::new(),
            regex_include: String::new(),
            regex_exclude: String::new(),
            active: true,
            move_completed: String::new(),
            download_location: String::new(),
            last_update: String::new(),
            key: None,
        }
    }
}

fn insert_key(record: &mut Record, key: Option<String>) {
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        record.insert("key".into(), Value::String(key));
    }
}

/// Create a new feed record.
pub fn fresh_rssfeed(fields: RssFeedFields) -> Record {
    let mut record = Record::new();
    record.insert("name".into(), fields.name.into());
    record.insert("url".into(), fields.url.into());
    record.insert("site".into(), fields.site.into());
    record.insert("active".into(), fields.active.into());
    record.insert("last_update".into(), fields.last_update.into());
    record.insert("update_interval".into(), fields.update_interval.into());
    record.insert("obey_ttl".into(), fields.obey_ttl.into());
    insert_key(&mut record, fields.key);
    record
}

/// Create a new subscription record.
pub fn fresh_subscription(fields: SubscriptionFields) -> Record {
    let mut record = Record::new();
    record.insert("rssfeed_key".into(), fields.rssfeed_key.into());
    record.insert("regex_include".into(), fields.regex_include.into());
    record.insert("regex_include_ignorecase".into(), true.into());
    record.insert("regex_exclude".into(), fields.regex_exclude.into());
    record.insert("regex_exclude_ignorecase".into(), true.into());
    record.insert("name".into(), fields.name.into());
    record.insert("active".into(), fields.active.into());
    record.insert("last_update".into(), fields.last_update.into());
    record.insert("move_completed".into(), fields.move_completed.into());
    record.insert("download_location".into(), fields.download_location.into());
    record.insert("custom_text_lines".into(), "".into());
    record.insert("add_torrents_in_paused_state".into(), false.into());
    // Keys are keys of the email_messages collection
    record.insert("email_notifications".into(), Value::Object(Map::new()));
    insert_key(&mut record, fields.key);
    record
}

/// Create a new email message record.
pub fn fresh_email_message() -> Record {
    let mut record = Record::new();
    record.insert("name".into(), "".into());
    record.insert("to_address".into(), "".into());
    record.insert("subject".into(), "".into());
    record.insert("message".into(), "".into());
    record.insert("active".into(), true.into());
    record
}

/// Create the default email server settings record.
pub fn fresh_email_configurations() -> Record {
    let mut record = Record::new();
    record.insert("send_email_on_torrent_events".into(), false.into());
    record.insert("from_address".into(), "".into());
    record.insert("smtp_server".into(), "".into());
    record.insert("smtp_port".into(), "".into());
    record.insert("smtp_authentication".into(), false.into());
    record.insert("smtp_username".into(), "".into());
    record.insert("smtp_password".into(), "".into());
    record.insert("default_email_to_address".into(), "".into());
    record.insert("default_email_subject".into(), DEFAULT_EMAIL_SUBJECT.into());
    record.insert("default_email_message".into(), DEFAULT_EMAIL_MESSAGE.into());
    record
}

/// Create a new cookie record.
pub fn fresh_cookie() -> Record {
    let mut record = Record::new();
    record.insert("site".into(), "".into());
    record.insert("value".into(), Value::Array(Vec::new()));
    record.insert("active".into(), true.into());
    record
}

/// The fresh default record for a collection kind.
pub fn template(kind: CollectionKind) -> Record {
    match kind {
        CollectionKind::RssFeeds => fresh_rssfeed(RssFeedFields::default()),
        CollectionKind::Subscriptions => fresh_subscription(SubscriptionFields::default()),
        CollectionKind::EmailMessages => fresh_email_message(),
        CollectionKind::EmailConfigurations => fresh_email_configurations(),
        CollectionKind::Cookies => fresh_cookie(),
    }
}
