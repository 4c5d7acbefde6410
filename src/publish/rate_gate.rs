//! Cooldown between deliveries.
//!
//! Independent of dedup: even fresh items are held back until the cooldown
//! since the last confirmed delivery has elapsed.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::publish::fingerprint::Fingerprint;

/// What the gate remembers about the last confirmed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    /// Fingerprint of the last delivered item.
    pub last_fingerprint: Option<Fingerprint>,
    /// When it was delivered.
    pub last_delivered_at: Option<DateTime<Utc>>,
}

/// Result of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Publishing may proceed.
    Open,
    /// Cooldown still running.
    Closed {
        /// Time until the cooldown ends.
        retry_after: Duration,
    },
}

impl GateDecision {
    /// Check if publishing may proceed.
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }
}

/// Cooldown gate.
#[derive(Debug)]
pub struct RateGate {
    cooldown: Duration,
    state: Mutex<CooldownState>,
}

impl RateGate {
    /// Create a gate with the given cooldown and no delivery history.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: Mutex::new(CooldownState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CooldownState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configured cooldown.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether a delivery may happen at `now`.
    ///
    /// A clock that moved backwards counts as zero elapsed time.
    pub fn check(&self, now: DateTime<Utc>) -> GateDecision {
        let Some(last) = self.lock().last_delivered_at else {
            return GateDecision::Open;
        };

        let elapsed = now
            .signed_duration_since(last)
            .to_std()
            .unwrap_or(Duration::ZERO);

        if elapsed < self.cooldown {
            GateDecision::Closed {
                retry_after: self.cooldown - elapsed,
            }
        } else {
            GateDecision::Open
        }
    }

    /// Shorthand for `check(now).is_open()`.
    pub fn may_publish(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_open()
    }

    /// Record a confirmed delivery. Both fields change together.
    pub fn record_delivery(&self, fp: Fingerprint, now: DateTime<Utc>) {
        *self.lock() = CooldownState {
            last_fingerprint: Some(fp),
            last_delivered_at: Some(now),
        };
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CooldownState {
        *self.lock()
    }
}
