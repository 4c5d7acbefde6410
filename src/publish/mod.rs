//! Publishing core.
//!
//! Fingerprinting, the seen-set, the cooldown gate, the single-flight guard,
//! the cycle controller and the scheduler that drives it.

pub mod cycle;
pub mod dedup;
pub mod fingerprint;
pub mod guard;
pub mod rate_gate;
pub mod scheduler;

pub use cycle::{CycleController, CycleOutcome, CycleSettings, PublisherState};
pub use dedup::DedupStore;
pub use fingerprint::{fingerprint, Fingerprint};
pub use guard::{PublishGuard, PublishPermit};
pub use rate_gate::{CooldownState, GateDecision, RateGate};
pub use scheduler::{start_scheduler, Scheduler};
