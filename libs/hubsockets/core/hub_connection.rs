//! Default owning connection
//!
//! [`HubConnection`] implements [`Connection`] on top of a [`HubConfig`]: it
//! holds the connection state and liveness timestamps, routes the logging
//! sink to `tracing`, queues classified errors and inbound application
//! messages on crossbeam channels, and parses raw frames.

use crate::config::HubConfig;
use crate::connection_state::{AtomicConnectionState, ConnectionState};
use crate::handshake::RECORD_SEPARATOR;
use crate::liveness::LivenessTracker;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Message type of a keep-alive ping frame
pub const MESSAGE_TYPE_PING: u64 = 6;

/// Message type of a server close frame
pub const MESSAGE_TYPE_CLOSE: u64 = 7;

pub struct HubConnection {
    config: HubConfig,
    state: AtomicConnectionState,
    liveness: LivenessTracker,
    auto_reconnect: AtomicBool,
    error_tx: Sender<TransportError>,
    error_rx: Receiver<TransportError>,
    message_tx: Sender<Value>,
    message_rx: Receiver<Value>,
}

impl HubConnection {
    pub fn new(config: HubConfig) -> Self {
        let (error_tx, error_rx) = unbounded();
        let (message_tx, message_rx) = unbounded();
        Self {
            auto_reconnect: AtomicBool::new(config.auto_reconnect),
            config,
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            liveness: LivenessTracker::new(),
            error_tx,
            error_rx,
            message_tx,
            message_rx,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn liveness(&self) -> &LivenessTracker {
        &self.liveness
    }

    /// Set the state directly, e.g. to `Connecting` before the first start
    pub fn set_state(&self, state: ConnectionState) {
        self.state.set(state);
    }

    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::Release);
    }

    /// Classified errors forwarded by the transport
    pub fn errors(&self) -> Receiver<TransportError> {
        self.error_rx.clone()
    }

    /// Application messages parsed from inbound frames
    pub fn messages(&self) -> Receiver<Value> {
        self.message_rx.clone()
    }

    fn process_record(&self, record: &str, outcome: &mut FrameOutcome) {
        let value: Value = match serde_json::from_str(record) {
            Ok(value) => value,
            Err(e) => {
                outcome.error = Some(TransportError::new(
                    ErrorKind::UnknownError,
                    format!("Invalid frame: {}", e),
                ));
                return;
            }
        };

        if let Some(message) = value.get("error").and_then(Value::as_str) {
            outcome.error = Some(TransportError::new(ErrorKind::UnknownError, message));
        }

        match value.get("type").and_then(Value::as_u64) {
            Some(MESSAGE_TYPE_PING) => debug!("Keep-alive frame received"),
            Some(MESSAGE_TYPE_CLOSE) => outcome.disconnected = true,
            _ => {
                if let Some(id) = value.get("invocationId").and_then(invocation_id) {
                    outcome.message_id = id;
                }
                // An empty object is the handshake acknowledgement
                let is_empty = value.as_object().map_or(false, |object| object.is_empty());
                if !is_empty && outcome.error.is_none() {
                    let _ = self.message_tx.send(value);
                }
            }
        }
    }
}

fn invocation_id(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

impl Connection for HubConnection {
    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn change_state(&self, from: ConnectionState, to: ConnectionState) -> bool {
        match self.state.compare_exchange(from, to) {
            Ok(_) => {
                info!("Connection state {} -> {}", from, to);
                true
            }
            Err(actual) => {
                debug!("Connection state is {}, not {}; staying", actual, from);
                false
            }
        }
    }

    fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::Acquire)
    }

    fn ensure_reconnecting(&self) -> bool {
        self.state.get() == ConnectionState::Reconnecting
    }

    fn reconnect_wait_time(&self) -> Duration {
        self.config.reconnect_wait()
    }

    fn protocol_version(&self) -> String {
        self.config.protocol_version.clone()
    }

    fn web_sockets_url(&self) -> String {
        self.config.url.clone()
    }

    fn use_default_context_paths(&self) -> bool {
        self.config.use_default_context_paths
    }

    fn use_default_query_string(&self) -> bool {
        self.config.use_default_query_string
    }

    fn receive_query_string(&self, transport_type: &str) -> String {
        let mut query = format!(
            "?transport={}&clientProtocol={}",
            urlencoding::encode(transport_type),
            urlencoding::encode(&self.config.protocol_version)
        );
        if let Some(ref token) = self.config.connection_token {
            query.push_str("&connectionToken=");
            query.push_str(&urlencoding::encode(token));
        }
        query
    }

    fn additional_query_string(&self) -> Vec<(String, String)> {
        self.config.query_pairs()
    }

    fn additional_headers(&self) -> Headers {
        self.config.headers.clone()
    }

    fn emit_log_message(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Debug => debug!("{}", message),
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }

    fn on_error(&self, error: TransportError) {
        let _ = self.error_tx.send(error);
    }

    fn update_last_retry_time(&self) {
        self.liveness.record_retry();
    }

    fn update_last_keep_alive(&self) {
        self.liveness.record_activity();
    }

    fn process_messages(&self, frame: &str) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();
        for record in frame
            .split(RECORD_SEPARATOR)
            .map(str::trim)
            .filter(|record| !record.is_empty())
        {
            self.process_record(record, &mut outcome);
            if outcome.error.is_some() {
                break;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> HubConnection {
        HubConnection::new(HubConfig::new("http://localhost/hub"))
    }

    #[test]
    fn test_handshake_ack_is_not_a_message() {
        let conn = connection();
        let outcome = conn.process_messages("{}\u{1e}");
        assert_eq!(outcome, FrameOutcome::ok(0));
        assert!(conn.messages().try_recv().is_err());
    }

    #[test]
    fn test_handshake_error_field() {
        let conn = connection();
        let frame = "{\"error\":\"Requested protocol 'json' is not available.\"}\u{1e}";
        let outcome = conn.process_messages(frame);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, ErrorKind::UnknownError);
        assert!(error.message.contains("not available"));
    }

    #[test]
    fn test_multiple_records_and_message_id() {
        let conn = connection();
        let frame = concat!(
            "{\"type\":6}\u{1e}",
            "{\"type\":1,\"invocationId\":\"42\",\"target\":\"echo\"}\u{1e}"
        );
        let outcome = conn.process_messages(frame);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.message_id, 42);

        let message = conn.messages().try_recv().unwrap();
        assert_eq!(message["target"], "echo");
        assert!(conn.messages().try_recv().is_err());
    }

    #[test]
    fn test_close_and_invalid_frames() {
        let conn = connection();
        assert!(conn.process_messages("{\"type\":7}\u{1e}").disconnected);

        let outcome = conn.process_messages("not json\u{1e}");
        assert!(outcome.error.unwrap().message.starts_with("Invalid frame"));
    }

    #[test]
    fn test_receive_query_string() {
        let mut config = HubConfig::new("http://localhost/hub");
        config.connection_token = Some("a/b".into());
        let conn = HubConnection::new(config);
        assert_eq!(
            conn.receive_query_string("webSockets"),
            "?transport=webSockets&clientProtocol=1&connectionToken=a%2Fb"
        );
    }

    #[test]
    fn test_reconnect_policy_flags() {
        let conn = connection();
        assert!(conn.auto_reconnect());
        conn.set_auto_reconnect(false);
        assert!(!conn.auto_reconnect());

        assert!(!conn.ensure_reconnecting());
        conn.set_state(ConnectionState::Connected);
        assert!(conn.change_state(ConnectionState::Connected, ConnectionState::Reconnecting));
        assert!(conn.ensure_reconnecting());
        assert!(!conn.change_state(ConnectionState::Connected, ConnectionState::Reconnecting));
    }

    #[test]
    fn test_errors_are_queued() {
        let conn = connection();
        conn.on_error(TransportError::new(ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(conn.errors().try_recv().unwrap().kind, ErrorKind::ConnectionRefused);
    }
}
