//! Telegram Bot API delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::delivery::Delivery;
use crate::error::{FeedcastError, Result};
use crate::render::FormattedMessage;

/// Request timeout for the Bot API.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in a delivery error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Posts messages to one Telegram chat via `sendMessage`.
pub struct TelegramDelivery {
    client: Client,
    endpoint: String,
    channel_id: String,
    parse_mode: Option<String>,
}

impl TelegramDelivery {
    /// Create a delivery for the configured bot and channel.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() || config.channel_id.is_empty() {
            return Err(FeedcastError::Config(
                "telegram bot_token and channel_id are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FeedcastError::Delivery(format!("failed to create HTTP client: {e}")))?;

        let parse_mode = Some(config.parse_mode.trim())
            .filter(|mode| !mode.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            channel_id: config.channel_id.clone(),
            parse_mode,
        })
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn deliver(&self, message: &FormattedMessage) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.channel_id,
            text: &message.text,
            parse_mode: self.parse_mode.as_deref(),
        };

        // The endpoint embeds the bot token; strip it from transport errors
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FeedcastError::Delivery(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status.is_success() {
            debug!("Telegram accepted message for {}", self.channel_id);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        Err(FeedcastError::Delivery(format!(
            "Telegram API returned {status}: {body}"
        )))
    }
}
