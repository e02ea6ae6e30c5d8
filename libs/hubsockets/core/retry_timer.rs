//! Single-shot reconnect timer
//!
//! At most one cycle is armed at a time. Each cycle gets a fresh [`TimerId`];
//! a fire is acted on only if it carries the id of the armed cycle, which is
//! cleared (stopped and detached) the moment it is consumed. Repeated
//! disconnects therefore cannot stack timers, and a fire that raced a
//! cancellation is dropped.

use crate::traits::{TimerId, TimerScheduler};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct RetryTimer {
    armed: Option<TimerId>,
    interval: Duration,
    next_id: u64,
}

impl RetryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed_id(&self) -> Option<TimerId> {
        self.armed
    }

    /// Interval of the most recent arm
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm a new cycle
    ///
    /// Returns `None` without touching the scheduler if a cycle is already
    /// pending.
    pub fn arm(
        &mut self,
        interval: Duration,
        scheduler: &mut dyn TimerScheduler,
    ) -> Option<TimerId> {
        if self.armed.is_some() {
            return None;
        }
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.interval = interval;
        self.armed = Some(id);
        scheduler.schedule(id, interval);
        Some(id)
    }

    /// Stop and detach the armed cycle if `id` is it
    ///
    /// Returns false for stale or unknown ids.
    pub fn consume(&mut self, id: TimerId) -> bool {
        if self.armed == Some(id) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    /// Disarm the pending cycle, if any
    pub fn cancel(&mut self, scheduler: &mut dyn TimerScheduler) -> bool {
        match self.armed.take() {
            Some(id) => {
                scheduler.cancel(id);
                true
            }
            None => false,
        }
    }
}
