use std::fmt;
use std::time::Duration;

/// Identifies one armed timer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Clock used by the transport to schedule reconnect attempts
///
/// `schedule` must eventually report the fire back to the transport
/// (`WebSocketTransport::handle_timer_fired`) on the same execution context
/// that delivers socket events. `cancel` must guarantee the id is never
/// reported, or the transport will discard it as stale.
pub trait TimerScheduler: Send {
    fn schedule(&mut self, id: TimerId, delay: Duration);

    fn cancel(&mut self, id: TimerId);
}
