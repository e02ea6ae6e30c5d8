use crate::core::connection_state::ConnectionState;
use crate::traits::error::TransportError;
use crate::traits::socket::Headers;
use std::fmt;
use std::time::Duration;

/// Severity attached to messages sent to the connection's logging sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Result of handing a raw inbound frame to the connection's message processor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub error: Option<TransportError>,
    pub timed_out: bool,
    pub disconnected: bool,
    pub message_id: u64,
}

impl FrameOutcome {
    pub fn ok(message_id: u64) -> Self {
        Self {
            message_id,
            ..Self::default()
        }
    }

    pub fn failed(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// The owning connection, as seen by the transport
///
/// The transport never holds connection-wide state itself: policy flags,
/// URLs, sinks and the message processor are all reached through this trait.
/// Implementations use interior mutability; every method takes `&self`.
pub trait Connection: Send + Sync {
    /// Transport-independent connection state
    fn state(&self) -> ConnectionState;

    /// Move from `from` to `to`; returns false if the current state was not `from`
    fn change_state(&self, from: ConnectionState, to: ConnectionState) -> bool;

    /// Reconnect automatically after an unexpected disconnect
    fn auto_reconnect(&self) -> bool;

    /// Whether the connection already considers itself reconnecting
    fn ensure_reconnecting(&self) -> bool;

    /// Delay before a scheduled reconnect attempt
    fn reconnect_wait_time(&self) -> Duration;

    /// Configured protocol version, e.g. "1" or "1.5"
    fn protocol_version(&self) -> String;

    /// Base endpoint (any of http, https, ws, wss)
    fn web_sockets_url(&self) -> String;

    fn use_default_context_paths(&self) -> bool;

    fn use_default_query_string(&self) -> bool;

    /// Default query string, including the leading `?`
    fn receive_query_string(&self, transport_type: &str) -> String;

    /// Caller-supplied query parameters, in order
    fn additional_query_string(&self) -> Vec<(String, String)>;

    fn additional_headers(&self) -> Headers;

    /// Logging sink
    fn emit_log_message(&self, message: &str, severity: Severity);

    /// Error sink for classified failures
    fn on_error(&self, error: TransportError);

    fn update_last_retry_time(&self);

    /// Liveness timestamp updated on every inbound frame
    fn update_last_keep_alive(&self);

    /// Parse one raw inbound frame
    fn process_messages(&self, frame: &str) -> FrameOutcome;
}
