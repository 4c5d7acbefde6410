//! Publishing scheduler.
//!
//! Runs the cycle controller forever: once per tick, or after the shorter
//! retry interval when a cycle dies unexpectedly.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use crate::config::PublisherConfig;
use crate::publish::cycle::{CycleController, CycleOutcome};

/// Background publishing loop.
pub struct Scheduler {
    controller: Arc<CycleController>,
    tick_interval: Duration,
    retry_interval: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    /// Create a scheduler using the intervals from `config`.
    pub fn new(controller: Arc<CycleController>, config: &PublisherConfig) -> Self {
        Self {
            controller,
            tick_interval: config.tick_interval(),
            retry_interval: config.retry_interval(),
            initial_delay: config.initial_delay(),
        }
    }

    /// Run a single cycle on its own task.
    ///
    /// A panic inside the cycle comes back as a `JoinError` instead of
    /// taking the scheduler down with it.
    pub async fn run_once(&self) -> Result<CycleOutcome, JoinError> {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move { controller.run_cycle().await }).await
    }

    /// Run the scheduler loop. Never returns.
    pub async fn run(&self) {
        info!(
            "Publisher started (tick: {}s, retry: {}s, first cycle in {}s)",
            self.tick_interval.as_secs(),
            self.retry_interval.as_secs(),
            self.initial_delay.as_secs()
        );

        if !self.initial_delay.is_zero() {
            sleep(self.initial_delay).await;
        }

        loop {
            let wait = match self.run_once().await {
                Ok(outcome) => {
                    debug!("Cycle finished: {:?}", outcome);
                    self.tick_interval
                }
                Err(e) => {
                    error!(
                        "Publishing cycle crashed, retrying in {}s: {}",
                        self.retry_interval.as_secs(),
                        e
                    );
                    self.retry_interval
                }
            };

            debug!("Next cycle in {}s", wait.as_secs());
            sleep(wait).await;
        }
    }
}

/// Start the scheduler as a background task.
pub fn start_scheduler(controller: Arc<CycleController>, config: &PublisherConfig) -> JoinHandle<()> {
    let scheduler = Scheduler::new(controller, config);
    tokio::spawn(async move {
        scheduler.run().await;
    })
}
