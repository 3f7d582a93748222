//! Feed URL normalization.

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// URL schemes a feed may use.
pub const ALLOWED_FEED_SCHEMES: [&str; 5] = ["http", "https", "ftp", "file", "feed"];

/// A feed URL with whitespace escaped, plus the site it belongs to.
///
/// `site` is the URL's authority exactly as written, including any user
/// info and port. Subscriptions and cookie entries are matched against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLocation {
    pub url: String,
    pub site: String,
}

impl FeedLocation {
    /// Normalize a user-entered feed URL.
    ///
    /// Surrounding whitespace is trimmed and inner whitespace becomes `%20`.
    /// The scheme must be one of [`ALLOWED_FEED_SCHEMES`].
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .fold(String::with_capacity(raw.len()), |mut out, c| {
                if c.is_whitespace() {
                    out.push_str("%20");
                } else {
                    out.push(c);
                }
                out
            });

        let parsed = Url::parse(&normalized).map_err(|e| {
            ConfigError::invalid_argument(format!("Invalid feed URL '{}': {}", normalized, e))
        })?;

        if !ALLOWED_FEED_SCHEMES.contains(&parsed.scheme()) {
            return Err(ConfigError::invalid_argument(format!(
                "The RSS Feed URL must begin with one of: {}",
                ALLOWED_FEED_SCHEMES.join(", ")
            )));
        }

        let site = authority(&normalized).to_string();
        Ok(Self {
            url: normalized,
            site,
        })
    }
}

/// The `//authority` part of a URL, unchanged. Empty when there is none.
fn authority(url: &str) -> &str {
    let Some((_, rest)) = url.split_once(':') else {
        return "";
    };
    let Some(rest) = rest.strip_prefix("//") else {
        return "";
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest.get(..end).unwrap_or_default()
}
