//! Feed fetcher.
//!
//! Pulls RSS/Atom documents over HTTP and turns their entries into
//! [`ContentItem`]s. URLs pointing at loopback, private or internal hosts
//! are refused before any request is made.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use crate::config::FetcherConfig;
use crate::error::{FeedcastError, Result};
use crate::feed::types::{ContentItem, FeedSource};

/// Source of content items.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current items of `source`, in feed order.
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<ContentItem>>;
}

/// HTTP feed fetcher backed by `reqwest` and `feed-rs`.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
    max_items: usize,
    max_summary_length: usize,
}

impl FeedFetcher {
    /// Create a fetcher with the given limits.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FeedcastError::Fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            max_items: config.max_items_per_feed,
            max_summary_length: config.max_summary_length,
        })
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_feed_size {
            return Err(FeedcastError::Fetch(format!(
                "feed too large: {size} bytes (max {} bytes)",
                self.max_feed_size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Fetcher for FeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<ContentItem>> {
        validate_url(&source.url)?;

        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| FeedcastError::Fetch(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(FeedcastError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length)?;
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedcastError::Fetch(format!("failed to read response: {e}")))?;
        self.check_size(bytes.len() as u64)?;

        parse_items(
            &bytes,
            &source.name,
            self.max_items,
            self.max_summary_length,
        )
    }
}

/// Validate a feed URL.
///
/// Only http and https are accepted, and the host must not resolve to a
/// loopback, private, link-local or internal name.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| FeedcastError::Validation(format!("invalid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FeedcastError::Validation(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let refused = match parsed.host() {
        None => return Err(FeedcastError::Validation("URL has no host".to_string())),
        Some(url::Host::Domain(domain)) => is_internal_hostname(domain),
        Some(url::Host::Ipv4(ip)) => is_non_public_ip(IpAddr::V4(ip)),
        Some(url::Host::Ipv6(ip)) => is_non_public_ip(IpAddr::V6(ip)),
    };

    if refused {
        return Err(FeedcastError::Validation(format!(
            "refusing non-public host: {}",
            parsed.host_str().unwrap_or_default()
        )));
    }
    Ok(())
}

const INTERNAL_SUFFIXES: &[&str] = &[
    ".local",
    ".localhost",
    ".internal",
    ".intranet",
    ".corp",
    ".home",
    ".lan",
];

fn is_internal_hostname(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost" || INTERNAL_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_non_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // TEST-NET-1/2/3
                || matches!((a, b, c), (192, 0, 2) | (198, 51, 100) | (203, 0, 113))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Parse a feed document into items tagged with `source_name`.
fn parse_items(
    bytes: &[u8],
    source_name: &str,
    max_items: usize,
    max_summary_length: usize,
) -> Result<Vec<ContentItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| FeedcastError::Fetch(format!("failed to parse feed: {e}")))?;

    let items = feed
        .entries
        .into_iter()
        .take(max_items)
        .map(|entry| {
            let title = entry
                .title
                .map(|t| strip_html(&t.content))
                .unwrap_or_default();
            let summary = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .map(|s| truncate_chars(&strip_html(&s), max_summary_length))
                .filter(|s| !s.is_empty());

            ContentItem {
                source: source_name.to_string(),
                title,
                summary,
                link: entry.links.first().map(|l| l.href.clone()),
                published_at: entry.published.or(entry.updated),
            }
        })
        .filter(|item| !item.title.is_empty() || item.summary.is_some())
        .collect();

    Ok(items)
}

/// Strip tags and decode common entities, collapsing whitespace.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '<' if starts_tag(chars.as_str()) => {
                // Skip to the end of the tag
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
                text.push(' ');
            }
            '&' => {
                let rest = chars.as_str();
                match rest.find(';').filter(|&end| end <= 10) {
                    Some(end) => {
                        let entity = &rest[..end];
                        match decode_entity(entity) {
                            Some(decoded) => text.push(decoded),
                            None => {
                                text.push('&');
                                text.push_str(entity);
                                text.push(';');
                            }
                        }
                        chars = rest[end + 1..].chars();
                    }
                    None => text.push('&'),
                }
            }
            _ => text.push(ch),
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether text after a `<` opens a tag, comment or declaration.
fn starts_tag(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
