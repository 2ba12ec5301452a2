use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::gate::sweep::PeriodicTask;
use crate::gate::time::{SystemTimeProvider, TimeProvider};

/// Shortest replay window the cache will run with.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Error type for replay cache operations.
#[derive(Debug, thiserror::Error)]
pub enum ReplayCacheError {
    #[error("replay cache operation failed: {0}")]
    Other(String),
}

/// Replay cache abstraction for refusing proofs that were accepted recently.
pub trait ReplayCache: Send + Sync {
    /// Record `id` as seen unless it already is.
    ///
    /// Returns `Ok(true)` if this call inserted it, `Ok(false)` if it was
    /// already present. A present entry keeps its original timestamp. The
    /// check and the insert are one atomic step.
    fn admit(&self, id: &[u8]) -> Result<bool, ReplayCacheError>;

    /// Drop every entry older than the TTL and return how many went.
    fn sweep(&self) -> usize;

    /// Number of entries currently held.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory replay cache backed by `moka::sync::Cache` storing first-seen
/// timestamps (unix millis).
///
/// Entries leave only through [`ReplayCache::sweep`]. There is no capacity
/// bound, since evicting by size would let a proof be replayed early. Run the
/// sweep every TTL with [`MokaReplayCache::spawn_sweeper`], so an entry lives
/// between one and two TTLs.
#[derive(Debug)]
pub struct MokaReplayCache<T: TimeProvider = SystemTimeProvider> {
    inner: Cache<Vec<u8>, u64>,
    ttl: Duration,
    time_provider: Arc<T>,
}

impl MokaReplayCache<SystemTimeProvider> {
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemTimeProvider))
    }
}

impl<T: TimeProvider + 'static> MokaReplayCache<T> {
    /// Build a cache with the given replay window, floored at [`MIN_TTL`].
    pub fn new(ttl: Duration, time_provider: Arc<T>) -> Self {
        let ttl = if ttl < MIN_TTL {
            warn!(requested = ?ttl, floor = ?MIN_TTL, "replay ttl below floor, clamping");
            MIN_TTL
        } else {
            ttl
        };
        Self {
            inner: Cache::builder().build(),
            ttl,
            time_provider,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start sweeping this cache once per TTL on a background thread.
    ///
    /// The sweep stops when the returned task is stopped or dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> std::io::Result<PeriodicTask> {
        let cache = Arc::clone(self);
        PeriodicTask::spawn("powgate-replay-sweep", self.ttl, move || {
            cache.sweep();
        })
    }
}

impl<T: TimeProvider> ReplayCache for MokaReplayCache<T> {
    fn admit(&self, id: &[u8]) -> Result<bool, ReplayCacheError> {
        let now = self.time_provider.now_millis();
        let entry = self.inner.entry_by_ref(id).or_insert_with(|| now);
        Ok(entry.is_fresh())
    }

    fn sweep(&self) -> usize {
        let now = self.time_provider.now_millis();
        let ttl_ms = self.ttl.as_millis() as u64;
        let mut removed = 0usize;
        for (key, first_seen) in self.inner.iter() {
            if now.saturating_sub(first_seen) > ttl_ms {
                self.inner.invalidate(key.as_slice());
                removed += 1;
            }
        }
        self.inner.run_pending_tasks();
        debug!(removed, remaining = self.inner.entry_count(), "replay cache swept");
        removed
    }

    fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}
