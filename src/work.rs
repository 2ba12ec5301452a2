//! Shared atomic helpers for coordinating search workers.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Early-stop flag shared by all workers of one search.
#[derive(Debug, Default)]
pub struct StopFlag {
    stop: AtomicBool,
}

impl StopFlag {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Attempt counter with an optional upper bound, shared across workers.
#[derive(Debug)]
pub struct AttemptBudget {
    limit: Option<u64>,
    used: AtomicU64,
}

impl AttemptBudget {
    pub const fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    pub const fn unlimited() -> Self {
        Self::new(None)
    }

    /// Reserve one attempt; returns `false` once the limit is reached.
    #[inline]
    pub fn try_take(&self) -> bool {
        match self.limit {
            None => {
                self.used.fetch_add(1, Ordering::Relaxed);
                true
            }
            Some(limit) => {
                // Claims past the limit are not rolled back, `used()` clamps them.
                self.used.fetch_add(1, Ordering::Relaxed) < limit
            }
        }
    }

    /// Attempts handed out so far.
    pub fn used(&self) -> u64 {
        let used = self.used.load(Ordering::Relaxed);
        match self.limit {
            Some(limit) => used.min(limit),
            None => used,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.used.load(Ordering::Relaxed) >= limit)
    }
}
