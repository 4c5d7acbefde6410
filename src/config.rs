//! Configuration module for feedcast.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{FeedcastError, Result};

/// Publishing cadence and collaborator time bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Minimum interval between two successful deliveries, in seconds.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Scheduler tick interval in seconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Wait before retrying after a fatal cycle error, in seconds.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
    /// Delay before the first cycle after startup, in seconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    /// Upper bound for a single feed fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Upper bound for a single delivery, in seconds.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,
    /// Consecutive delivery failures before an item is abandoned (0 = never).
    #[serde(default)]
    pub max_delivery_attempts: u32,
}

fn default_cooldown() -> u64 {
    1500 // 25 minutes
}

fn default_tick_interval() -> u64 {
    1800 // 30 minutes
}

fn default_retry_interval() -> u64 {
    60
}

fn default_initial_delay() -> u64 {
    60
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_delivery_timeout() -> u64 {
    30
}

impl PublisherConfig {
    /// Cooldown as a `Duration`.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Fallback retry interval as a `Duration`.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Initial delay as a `Duration`.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Delivery timeout as a `Duration`.
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            tick_interval_secs: default_tick_interval(),
            retry_interval_secs: default_retry_interval(),
            initial_delay_secs: default_initial_delay(),
            fetch_timeout_secs: default_fetch_timeout(),
            delivery_timeout_secs: default_delivery_timeout(),
            max_delivery_attempts: 0,
        }
    }
}

/// A single feed to poll. Order in the config file is source priority.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSourceConfig {
    /// Display name used in messages and logs.
    pub name: String,
    /// Feed URL (RSS or Atom).
    pub url: String,
}

/// HTTP fetcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum items kept per feed.
    #[serde(default = "default_max_items")]
    pub max_items_per_feed: usize,
    /// Maximum summary length in characters.
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_items() -> usize {
    50
}

fn default_max_summary_length() -> usize {
    4000
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    "feedcast/0.1 (feed publisher)".to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_feed_size_bytes: default_max_feed_size(),
            max_items_per_feed: default_max_items(),
            max_summary_length: default_max_summary_length(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// Message rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// First line of every message.
    #[serde(default = "default_header")]
    pub header: String,
    /// Trailing line. `{minutes}` expands to the tick interval in minutes.
    #[serde(default = "default_footer")]
    pub footer: Option<String>,
    /// Summary length limit in characters.
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
}

fn default_header() -> String {
    "📰 *Latest news*".to_string()
}

fn default_footer() -> Option<String> {
    Some("⏰ _Next update in {minutes} minutes_".to_string())
}

fn default_max_summary_chars() -> usize {
    1000
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            footer: default_footer(),
            max_summary_chars: default_max_summary_chars(),
        }
    }
}

/// Telegram delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (prefer `FEEDCAST_BOT_TOKEN`).
    #[serde(default)]
    pub bot_token: String,
    /// Destination chat or channel id.
    #[serde(default)]
    pub channel_id: String,
    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Parse mode sent with every message.
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            api_base: default_api_base(),
            parse_mode: default_parse_mode(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Publishing cadence.
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Feeds in priority order.
    #[serde(default)]
    pub feeds: Vec<FeedSourceConfig>,
    /// HTTP fetcher limits.
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Message rendering.
    #[serde(default)]
    pub render: RenderConfig,
    /// Telegram destination.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Env vars for the bot token, highest priority first.
const BOT_TOKEN_VARS: &[&str] = &["FEEDCAST_BOT_TOKEN", "BOT_TOKEN"];

/// Env vars for the channel id, highest priority first.
const CHANNEL_ID_VARS: &[&str] = &["FEEDCAST_CHANNEL_ID", "CHANNEL_ID"];

fn first_non_empty_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FeedcastError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedcastError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDCAST_BOT_TOKEN` or `BOT_TOKEN`: Telegram bot token
    /// - `FEEDCAST_CHANNEL_ID` or `CHANNEL_ID`: destination channel
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = first_non_empty_env(BOT_TOKEN_VARS) {
            self.telegram.bot_token = token;
        }
        if let Some(channel) = first_non_empty_env(CHANNEL_ID_VARS) {
            self.telegram.channel_id = channel;
        }
    }

    /// Validate the configuration.
    ///
    /// Missing destination credentials are the one startup error the
    /// publisher cannot recover from.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() || self.telegram.channel_id.is_empty() {
            return Err(FeedcastError::Config(
                "telegram bot_token and channel_id must be set. \
                 Set them in config.toml or via FEEDCAST_BOT_TOKEN / FEEDCAST_CHANNEL_ID."
                    .to_string(),
            ));
        }
        if self.feeds.is_empty() {
            return Err(FeedcastError::Config(
                "at least one [[feeds]] entry is required".to_string(),
            ));
        }
        let p = &self.publisher;
        for (name, value) in [
            ("tick_interval_secs", p.tick_interval_secs),
            ("retry_interval_secs", p.retry_interval_secs),
            ("fetch_timeout_secs", p.fetch_timeout_secs),
            ("delivery_timeout_secs", p.delivery_timeout_secs),
        ] {
            if value == 0 {
                return Err(FeedcastError::Config(format!(
                    "publisher.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.telegram.bot_token = "123:abc".to_string();
        config.telegram.channel_id = "@news".to_string();
        config.feeds.push(FeedSourceConfig {
            name: "Example".to_string(),
            url: "https://example.com/feed.xml".to_string(),
        });
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.publisher.cooldown_secs, 1500);
        assert_eq!(config.publisher.tick_interval_secs, 1800);
        assert_eq!(config.publisher.retry_interval_secs, 60);
        assert_eq!(config.publisher.initial_delay_secs, 60);
        assert_eq!(config.publisher.fetch_timeout_secs, 30);
        assert_eq!(config.publisher.delivery_timeout_secs, 30);
        assert_eq!(config.publisher.max_delivery_attempts, 0);

        assert!(config.feeds.is_empty());

        assert_eq!(config.fetcher.max_feed_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.fetcher.max_items_per_feed, 50);
        assert_eq!(config.fetcher.max_redirects, 5);

        assert_eq!(config.render.max_summary_chars, 1000);
        assert!(config.render.footer.is_some());

        assert!(config.telegram.bot_token.is_empty());
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.parse_mode, "Markdown");

        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[publisher]
cooldown_secs = 600
tick_interval_secs = 900
retry_interval_secs = 120
initial_delay_secs = 5
fetch_timeout_secs = 15
delivery_timeout_secs = 20
max_delivery_attempts = 3

[[feeds]]
name = "First"
url = "https://first.example.com/rss"

[[feeds]]
name = "Second"
url = "https://second.example.com/atom"

[fetcher]
max_items_per_feed = 10
user_agent = "custom-agent"

[render]
header = "NEWS"
max_summary_chars = 200

[telegram]
bot_token = "token"
channel_id = "-100123"
parse_mode = "HTML"

[logging]
level = "debug"
file = "logs/feedcast.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.publisher.cooldown(), Duration::from_secs(600));
        assert_eq!(config.publisher.tick_interval(), Duration::from_secs(900));
        assert_eq!(config.publisher.retry_interval(), Duration::from_secs(120));
        assert_eq!(config.publisher.initial_delay(), Duration::from_secs(5));
        assert_eq!(config.publisher.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.publisher.delivery_timeout(), Duration::from_secs(20));
        assert_eq!(config.publisher.max_delivery_attempts, 3);

        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].name, "First");
        assert_eq!(config.feeds[1].url, "https://second.example.com/atom");

        assert_eq!(config.fetcher.max_items_per_feed, 10);
        assert_eq!(config.fetcher.user_agent, "custom-agent");
        assert_eq!(config.fetcher.max_redirects, 5);

        assert_eq!(config.render.header, "NEWS");
        assert_eq!(config.render.max_summary_chars, 200);

        assert_eq!(config.telegram.bot_token, "token");
        assert_eq!(config.telegram.channel_id, "-100123");
        assert_eq!(config.telegram.parse_mode, "HTML");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/feedcast.log"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.publisher.cooldown_secs, 1500);
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(FeedcastError::Validation(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(FeedcastError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[publisher]\ncooldown_secs = 42").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.publisher.cooldown_secs, 42);
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars = ["FEEDCAST_BOT_TOKEN", "BOT_TOKEN", "FEEDCAST_CHANNEL_ID", "CHANNEL_ID"];
        let saved: Vec<_> = vars.iter().map(|v| std::env::var(v).ok()).collect();

        std::env::set_var("FEEDCAST_BOT_TOKEN", "env-token");
        std::env::set_var("BOT_TOKEN", "fallback-token");
        std::env::set_var("FEEDCAST_CHANNEL_ID", "");
        std::env::remove_var("CHANNEL_ID");

        let mut config = Config::default();
        config.telegram.channel_id = "@configured".to_string();
        config.apply_env_overrides();

        // Prefixed name wins; empty values never override
        assert_eq!(config.telegram.bot_token, "env-token");
        assert_eq!(config.telegram.channel_id, "@configured");

        for (name, value) in vars.iter().zip(saved) {
            match value {
                Some(val) => std::env::set_var(name, val),
                None => std::env::remove_var(name),
            }
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_credentials() {
        let mut config = valid_config();
        config.telegram.bot_token.clear();

        let result = config.validate();
        assert!(matches!(result, Err(FeedcastError::Config(ref msg)) if msg.contains("bot_token")));
    }

    #[test]
    fn test_validate_no_feeds() {
        let mut config = valid_config();
        config.feeds.clear();
        assert!(matches!(config.validate(), Err(FeedcastError::Config(_))));
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = valid_config();
        config.publisher.tick_interval_secs = 0;

        let result = config.validate();
        assert!(
            matches!(result, Err(FeedcastError::Config(ref msg)) if msg.contains("tick_interval_secs"))
        );
    }

    #[test]
    fn test_zero_cooldown_is_allowed() {
        let mut config = valid_config();
        config.publisher.cooldown_secs = 0;
        assert!(config.validate().is_ok());
    }
}
