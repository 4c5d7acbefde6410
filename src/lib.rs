//! feedcast - feed-to-channel publisher.
//!
//! Polls news feeds, skips items it has already published, and posts at most
//! one fresh item per cycle to a single channel, no more often than the
//! configured cooldown allows.

pub mod app;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod logging;
pub mod publish;
pub mod render;

pub use app::build_controller;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use delivery::{Delivery, TelegramDelivery};
pub use error::{FeedcastError, Result};
pub use feed::{ContentItem, FeedFetcher, FeedSource, Fetcher};
pub use publish::{
    fingerprint, start_scheduler, CooldownState, CycleController, CycleOutcome, CycleSettings,
    DedupStore, Fingerprint, GateDecision, PublishGuard, PublishPermit, PublisherState, RateGate,
    Scheduler,
};
pub use render::{FormattedMessage, Markup, MessageRenderer, Renderer, MAX_MESSAGE_CHARS};
