//! Liveness tracking
//!
//! Records when the last inbound frame arrived and when the last connection
//! attempt was made. A keep-alive monitor outside this crate polls
//! [`LivenessTracker::is_alive`] to decide whether a silent connection should
//! be torn down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free activity timestamps
///
/// Timestamps are stored as milliseconds since an internal epoch, offset by
/// one so that zero means "never".
pub struct LivenessTracker {
    epoch: Instant,
    last_activity_ms: AtomicU64,
    last_retry_ms: AtomicU64,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
            last_retry_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64 + 1
    }

    fn since(&self, slot: &AtomicU64) -> Option<Duration> {
        match slot.load(Ordering::Acquire) {
            0 => None,
            ms => Some(Duration::from_millis(self.now_ms().saturating_sub(ms))),
        }
    }

    /// Record that a frame was just received
    pub fn record_activity(&self) {
        self.last_activity_ms.store(self.now_ms(), Ordering::Release);
    }

    /// Record that a connection attempt was just started
    pub fn record_retry(&self) {
        self.last_retry_ms.store(self.now_ms(), Ordering::Release);
    }

    pub fn time_since_last_activity(&self) -> Option<Duration> {
        self.since(&self.last_activity_ms)
    }

    pub fn time_since_last_retry(&self) -> Option<Duration> {
        self.since(&self.last_retry_ms)
    }

    /// True if a frame arrived within `timeout`
    ///
    /// Before the first frame the connection counts as alive.
    pub fn is_alive(&self, timeout: Duration) -> bool {
        self.time_since_last_activity()
            .map_or(true, |elapsed| elapsed < timeout)
    }

    pub fn reset(&self) {
        self.last_activity_ms.store(0, Ordering::Release);
        self.last_retry_ms.store(0, Ordering::Release);
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new()
    }
}
