//! Wall-clock time source
//!
//! Registration timestamps come from a [`Clock`] handed to the ledger, so
//! tests can pin time without touching the system clock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unix timestamps in seconds
pub trait Clock: Send + Sync {
    /// Current unix time in seconds
    fn now_unix(&self) -> u64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Settable clock for deterministic tests
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    /// Clock frozen at `now`
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
