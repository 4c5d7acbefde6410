//! Shared test collaborators for feedcast integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use feedcast::{
    Clock, ContentItem, CycleController, Delivery, FeedSource, FeedcastError, Fetcher,
    FormattedMessage, ManualClock, PublisherState, Renderer, Result, MAX_MESSAGE_CHARS,
};

/// Fixed start time for scenario tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// Item with a title and summary from the "Wire" feed.
pub fn item(title: &str) -> ContentItem {
    ContentItem::new("Wire", title).with_summary(format!("{title} body"))
}

/// What a scripted feed does when fetched.
#[derive(Clone)]
pub enum FeedScript {
    Items(Vec<ContentItem>),
    Fail,
    /// Sleep before returning the items.
    Slow(Duration, Vec<ContentItem>),
}

/// Fetcher whose per-source answers can be changed between cycles.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, FeedScript>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, source: &str, script: FeedScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(source.to_string(), script);
    }

    pub fn set_items(&self, source: &str, items: Vec<ContentItem>) {
        self.set(source, FeedScript::Items(items));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().get(&source.name).cloned();
        match script {
            None => Ok(Vec::new()),
            Some(FeedScript::Items(items)) => Ok(items),
            Some(FeedScript::Fail) => Err(FeedcastError::Fetch("HTTP error: 502".to_string())),
            Some(FeedScript::Slow(delay, items)) => {
                tokio::time::sleep(delay).await;
                Ok(items)
            }
        }
    }
}

/// Renders the item title only.
pub struct TitleRenderer;

impl Renderer for TitleRenderer {
    fn render(&self, item: &ContentItem) -> FormattedMessage {
        FormattedMessage::new(item.title.clone())
    }
}

/// What a single delivery attempt does.
#[derive(Clone, Copy, Debug)]
pub enum DeliveryScript {
    Succeed,
    Fail,
    Panic,
    Hang,
}

/// Delivery that follows a script, then succeeds, and records accepted messages.
#[derive(Default)]
pub struct RecordingDelivery {
    script: Mutex<VecDeque<DeliveryScript>>,
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: DeliveryScript) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, message: &FormattedMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeliveryScript::Succeed);
        match step {
            DeliveryScript::Succeed => {
                self.sent.lock().unwrap().push(message.text.clone());
                Ok(())
            }
            DeliveryScript::Fail => Err(FeedcastError::Delivery(
                "Telegram API returned 500 Internal Server Error".to_string(),
            )),
            DeliveryScript::Panic => panic!("delivery collaborator panicked"),
            DeliveryScript::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Delivery that rejects over-long text the way the Telegram API does.
#[derive(Default)]
pub struct LengthCheckedDelivery {
    sent: Mutex<Vec<String>>,
}

impl LengthCheckedDelivery {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for LengthCheckedDelivery {
    async fn deliver(&self, message: &FormattedMessage) -> Result<()> {
        if message.text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(FeedcastError::Delivery(
                "Telegram API returned 400 Bad Request: message is too long".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.text.clone());
        Ok(())
    }
}

/// Clock that follows tokio's (pausable) timer clock.
pub struct TokioClock {
    start: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + chrono::Duration::from_std(self.origin.elapsed()).unwrap()
    }
}

/// A controller over `sources` with scripted collaborators.
pub struct Harness {
    pub fetcher: Arc<ScriptedFetcher>,
    pub delivery: Arc<RecordingDelivery>,
    pub clock: Arc<ManualClock>,
    pub controller: Arc<CycleController>,
}

impl Harness {
    /// Build a harness with a manual clock at `t0()`.
    pub fn new(sources: &[&str], cooldown: Duration) -> Self {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let delivery = Arc::new(RecordingDelivery::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let controller = CycleController::new(
            sources
                .iter()
                .map(|name| FeedSource::new(*name, format!("https://{name}.example.com/rss")))
                .collect(),
            fetcher.clone(),
            Arc::new(TitleRenderer),
            delivery.clone(),
            clock.clone(),
            Arc::new(PublisherState::new(cooldown)),
        );

        Self {
            fetcher,
            delivery,
            clock,
            controller: Arc::new(controller),
        }
    }

    /// Replace the controller with one using the given settings.
    pub fn with_settings(self, settings: feedcast::CycleSettings) -> Self {
        let controller = Arc::try_unwrap(self.controller)
            .ok()
            .expect("controller still shared")
            .with_settings(settings);
        Self {
            controller: Arc::new(controller),
            ..self
        }
    }

    pub fn state(&self) -> &PublisherState {
        self.controller.state()
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
