//! One poll, dedup, select, render and deliver cycle.
//!
//! Every cycle starts by taking the [`PublishGuard`]; the permit is held in a
//! local binding and released when `run_cycle` returns by any path. The
//! cooldown check and the post-delivery state update both happen while the
//! permit is held, so two cycles can never both pass the gate.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::PublisherConfig;
use crate::delivery::Delivery;
use crate::error::FeedcastError;
use crate::feed::{ContentItem, FeedSource, Fetcher};
use crate::publish::dedup::DedupStore;
use crate::publish::fingerprint::{fingerprint, Fingerprint};
use crate::publish::guard::PublishGuard;
use crate::publish::rate_gate::{GateDecision, RateGate};
use crate::render::Renderer;

/// Process-wide publisher state shared by all cycles.
#[derive(Debug)]
pub struct PublisherState {
    /// Delivered fingerprints.
    pub dedup: DedupStore,
    /// Cooldown since the last delivery.
    pub gate: RateGate,
    /// Single-flight flag.
    pub guard: PublishGuard,
}

impl PublisherState {
    /// Fresh state: nothing seen, no delivery yet, guard released.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            dedup: DedupStore::new(),
            gate: RateGate::new(cooldown),
            guard: PublishGuard::new(),
        }
    }
}

/// Time bounds and failure policy for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    /// Bound for each feed fetch.
    pub fetch_timeout: Duration,
    /// Bound for the delivery call.
    pub delivery_timeout: Duration,
    /// Consecutive failures before an item is dropped (0 = never).
    pub max_delivery_attempts: u32,
}

impl From<&PublisherConfig> for CycleSettings {
    fn from(config: &PublisherConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            delivery_timeout: config.delivery_timeout(),
            max_delivery_attempts: config.max_delivery_attempts,
        }
    }
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from(&PublisherConfig::default())
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle held the guard; nothing was done.
    Busy,
    /// The cooldown has not elapsed; nothing was fetched.
    CoolingDown {
        /// Time until the cooldown ends.
        retry_after: Duration,
    },
    /// No unseen item was available.
    NoCandidate,
    /// An item was delivered and recorded.
    Delivered {
        /// Fingerprint of the delivered item.
        fingerprint: Fingerprint,
    },
    /// Delivery of the selected item failed.
    DeliveryFailed {
        /// Fingerprint of the item.
        fingerprint: Fingerprint,
        /// Why delivery failed.
        error: String,
        /// True when the item hit the attempt limit and was dropped.
        abandoned: bool,
    },
}

impl CycleOutcome {
    /// Whether the cycle delivered an item.
    pub fn is_delivered(&self) -> bool {
        matches!(self, CycleOutcome::Delivered { .. })
    }
}

/// Runs publishing cycles against a set of feeds.
pub struct CycleController {
    sources: Vec<FeedSource>,
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn Renderer>,
    delivery: Arc<dyn Delivery>,
    clock: Arc<dyn Clock>,
    state: Arc<PublisherState>,
    settings: CycleSettings,
}

impl CycleController {
    /// Create a controller. `sources` are in priority order.
    pub fn new(
        sources: Vec<FeedSource>,
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
        delivery: Arc<dyn Delivery>,
        clock: Arc<dyn Clock>,
        state: Arc<PublisherState>,
    ) -> Self {
        Self {
            sources,
            fetcher,
            renderer,
            delivery,
            clock,
            state,
            settings: CycleSettings::default(),
        }
    }

    /// Override the default time bounds and failure policy.
    pub fn with_settings(mut self, settings: CycleSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Shared publisher state.
    pub fn state(&self) -> &Arc<PublisherState> {
        &self.state
    }

    /// Run one cycle.
    ///
    /// Never fails: feed and delivery errors are logged and reflected in the
    /// returned outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(_permit) = self.state.guard.try_enter() else {
            info!("Publishing cycle already in progress, skipping");
            return CycleOutcome::Busy;
        };

        if let GateDecision::Closed { retry_after } = self.state.gate.check(self.clock.now()) {
            info!(
                "Cooldown active, next delivery allowed in {}s",
                retry_after.as_secs()
            );
            return CycleOutcome::CoolingDown { retry_after };
        }

        debug!("Starting publishing cycle over {} feed(s)", self.sources.len());

        let batch: Vec<(ContentItem, Fingerprint)> = self
            .fetch_all()
            .await
            .into_iter()
            .map(|item| {
                let fp = fingerprint(&item);
                (item, fp)
            })
            .collect();

        // An empty batch usually means every feed failed; keep the counters then
        if !batch.is_empty() {
            self.state.dedup.prune_failures(batch.iter().map(|(_, fp)| fp));
        }

        let Some((item, fp)) = self.select_candidate(batch) else {
            info!("No new items to publish");
            return CycleOutcome::NoCandidate;
        };

        info!("Publishing \"{}\" from {} ({})", item.title, item.source, fp);
        let message = self.renderer.render(&item);

        let result = match timeout(self.settings.delivery_timeout, self.delivery.deliver(&message)).await
        {
            Ok(result) => result,
            Err(_) => Err(FeedcastError::Timeout {
                operation: "delivery",
                secs: self.settings.delivery_timeout.as_secs(),
            }),
        };

        match result {
            Ok(()) => {
                let now = self.clock.now();
                self.state.dedup.mark_seen(fp);
                self.state.gate.record_delivery(fp, now);
                info!("Delivered {} at {}", fp, now.to_rfc3339());
                CycleOutcome::Delivered { fingerprint: fp }
            }
            Err(e) => self.handle_delivery_failure(fp, e),
        }
    }

    /// Fetch every source concurrently. Failed or slow feeds contribute nothing.
    ///
    /// Batches come back in source order.
    async fn fetch_all(&self) -> Vec<ContentItem> {
        let fetches = self.sources.iter().map(|source| async move {
            match timeout(self.settings.fetch_timeout, self.fetcher.fetch(source)).await {
                Ok(Ok(items)) => {
                    debug!("Fetched {} item(s) from {}", items.len(), source.name);
                    items
                }
                Ok(Err(e)) => {
                    warn!("Failed to fetch feed {}: {}", source.name, e);
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        "Fetching feed {} timed out after {}s",
                        source.name,
                        self.settings.fetch_timeout.as_secs()
                    );
                    Vec::new()
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// First unseen item in source-priority, then feed, order.
    fn select_candidate(
        &self,
        batch: Vec<(ContentItem, Fingerprint)>,
    ) -> Option<(ContentItem, Fingerprint)> {
        let total = batch.len();
        let candidate = batch
            .into_iter()
            .find(|(_, fp)| self.state.dedup.is_new(fp));

        debug!(
            "Selected {} of {} fetched item(s)",
            usize::from(candidate.is_some()),
            total
        );
        candidate
    }

    fn handle_delivery_failure(&self, fp: Fingerprint, e: FeedcastError) -> CycleOutcome {
        let attempts = self.state.dedup.record_failure(fp);
        let limit = self.settings.max_delivery_attempts;
        let abandoned = limit > 0 && attempts >= limit;

        if abandoned {
            warn!(
                "Dropping {} after {} failed delivery attempt(s): {}",
                fp, attempts, e
            );
            self.state.dedup.mark_seen(fp);
        } else {
            error!(
                "Failed to deliver {} (attempt {}), will retry next cycle: {}",
                fp, attempts, e
            );
        }

        CycleOutcome::DeliveryFailed {
            fingerprint: fp,
            error: e.to_string(),
            abandoned,
        }
    }
}
