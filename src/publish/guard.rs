//! Single-flight publish guard.
//!
//! [`PublishGuard::try_enter`] hands out at most one [`PublishPermit`] at a
//! time. The permit clears the flag when dropped, which also happens while
//! unwinding from a panic, so no exit path of a cycle can leave the guard held.

use std::sync::atomic::{AtomicBool, Ordering};

/// Mutual-exclusion flag for publishing cycles.
#[derive(Debug, Default)]
pub struct PublishGuard {
    busy: AtomicBool,
}

impl PublishGuard {
    /// Create a released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the guard. Returns `None` if another cycle holds it.
    pub fn try_enter(&self) -> Option<PublishPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PublishPermit { guard: self })
    }

    /// Whether a cycle currently holds the guard.
    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Proof of holding the [`PublishGuard`]; releases it on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct PublishPermit<'a> {
    guard: &'a PublishGuard,
}

impl Drop for PublishPermit<'_> {
    fn drop(&mut self) {
        self.guard.leave();
    }
}
