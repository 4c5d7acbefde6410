//! Feed item types.

use chrono::{DateTime, Utc};

use crate::config::FeedSourceConfig;

/// A feed to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// Display name, copied onto every item fetched from this feed.
    pub name: String,
    /// Feed URL.
    pub url: String,
}

impl FeedSource {
    /// Create a new feed source.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl From<&FeedSourceConfig> for FeedSource {
    fn from(config: &FeedSourceConfig) -> Self {
        Self::new(&config.name, &config.url)
    }
}

/// One item pulled from a feed.
///
/// Items live for a single publishing cycle. The publisher never mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Name of the feed the item came from.
    pub source: String,
    /// Item title.
    pub title: String,
    /// Plain-text summary, HTML already stripped.
    pub summary: Option<String>,
    /// Link to the full article.
    pub link: Option<String>,
    /// Publication time, when the feed provides one.
    pub published_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// Create a new item with only a source and title.
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            summary: None,
            link: None,
            published_at: None,
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}
