//! Wiring of the production collaborators.

use std::sync::Arc;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::delivery::TelegramDelivery;
use crate::feed::{FeedFetcher, FeedSource};
use crate::publish::{CycleController, CycleSettings, PublisherState};
use crate::render::{Markup, MessageRenderer};
use crate::Result;

/// Build a cycle controller backed by HTTP feeds and Telegram.
///
/// The config should already be validated.
pub fn build_controller(config: &Config) -> Result<CycleController> {
    let sources = config.feeds.iter().map(FeedSource::from).collect();
    let fetcher = FeedFetcher::new(&config.fetcher)?;
    let renderer = MessageRenderer::new(
        &config.render,
        Markup::from_parse_mode(&config.telegram.parse_mode),
        config.publisher.tick_interval_secs / 60,
    );
    let delivery = TelegramDelivery::new(&config.telegram)?;
    let state = PublisherState::new(config.publisher.cooldown());

    Ok(CycleController::new(
        sources,
        Arc::new(fetcher),
        Arc::new(renderer),
        Arc::new(delivery),
        Arc::new(SystemClock),
        Arc::new(state),
    )
    .with_settings(CycleSettings::from(&config.publisher)))
}
