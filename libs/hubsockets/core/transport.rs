use crate::classifier::classify;
use crate::connect_url::build_connect_url;
use crate::connection_state::ConnectionState;
use crate::handshake::{protocol_version_number, HandshakeRequest};
use crate::retry_timer::RetryTimer;
use crate::session::TransportSession;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Transport type identifier reported to the owning connection
pub const TRANSPORT_TYPE: &str = "webSockets";

/// Notifications raised by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket connected; `error` is always empty for this transport
    Started { error: Option<TransportError> },
    /// The first frame after the handshake was accepted
    HandshakeCompleted,
    /// An inbound frame went through the message processor
    ///
    /// Also raised for the handshake acknowledgement, so consumers must not
    /// assume every notification corresponds to application data.
    FrameProcessed {
        error: Option<TransportError>,
        message_id: u64,
    },
}

/// WebSocket transport state machine
///
/// Owns the current socket and the reconnect timer. It never blocks and
/// never spawns: `start` returns as soon as the socket has been asked to
/// open, and everything that follows arrives through
/// [`handle_socket_event`](Self::handle_socket_event) and
/// [`handle_timer_fired`](Self::handle_timer_fired). The caller must deliver
/// those on one execution context, one at a time.
pub struct WebSocketTransport {
    connection: Arc<dyn Connection>,
    sockets: Box<dyn SocketFactory>,
    scheduler: Box<dyn TimerScheduler>,
    /// Socket of the current attempt; replaced, never reused
    socket: Option<Box<dyn Socket>>,
    session: TransportSession,
    retry_timer: RetryTimer,
    next_socket_id: u64,
    event_tx: Sender<TransportEvent>,
    event_rx: Receiver<TransportEvent>,
}

impl WebSocketTransport {
    pub fn new(
        connection: Arc<dyn Connection>,
        sockets: Box<dyn SocketFactory>,
        scheduler: Box<dyn TimerScheduler>,
    ) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            connection,
            sockets,
            scheduler,
            socket: None,
            session: TransportSession::new(),
            retry_timer: RetryTimer::new(),
            next_socket_id: 0,
            event_tx,
            event_rx,
        }
    }

    #[inline]
    pub fn transport_type(&self) -> &'static str {
        TRANSPORT_TYPE
    }

    /// Receiver for [`TransportEvent`]s
    ///
    /// The channel is unbounded and one notification is queued per inbound
    /// frame, so the receiver must be drained.
    pub fn events(&self) -> Receiver<TransportEvent> {
        self.event_rx.clone()
    }

    #[inline]
    pub fn is_handshake_completed(&self) -> bool {
        self.session.is_handshake_completed()
    }

    #[inline]
    pub fn is_handshaking(&self) -> bool {
        self.session.is_handshaking()
    }

    /// True once any connection attempt has reached the connected state
    #[inline]
    pub fn is_started(&self) -> bool {
        self.session.is_started()
    }

    pub fn current_socket_id(&self) -> Option<SocketId> {
        self.socket.as_ref().map(|socket| socket.id())
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.retry_timer.is_armed()
    }

    /// Open a new socket, replacing any existing one
    ///
    /// Any pending reconnect is cancelled; the new attempt supersedes it.
    pub fn start(&mut self, hint: Option<&str>) -> Result<()> {
        self.session.begin_attempt();
        self.connection.update_last_retry_time();
        self.cancel_reconnect();
        self.discard_socket();

        if let Some(hint) = hint {
            debug!("Start requested with hint: {}", hint);
        }

        let started = self.session.is_started();
        let url = match build_connect_url(self.connection.as_ref(), started, TRANSPORT_TYPE) {
            Ok(url) => url,
            Err(e) => {
                self.log(&format!("WebSocket: cannot build connect url: {}", e), Severity::Error);
                return Err(e);
            }
        };

        self.next_socket_id += 1;
        let mut socket = self.sockets.create(SocketId(self.next_socket_id));
        socket.set_additional_headers(&self.connection.additional_headers());

        self.log(&format!("websocket open url: {}", url), Severity::Info);
        socket.open(&url);
        self.socket = Some(socket);
        Ok(())
    }

    /// Write one frame if a socket exists
    ///
    /// A short write is only reported as a warning.
    pub fn send(&mut self, data: &str) {
        if let Some(socket) = self.socket.as_mut() {
            let written = socket.write(data);
            if written != data.len() {
                self.log("Written bytes does not equals given bytes", Severity::Warning);
            }
        }
    }

    /// Close and discard the socket and cancel any pending reconnect
    ///
    /// Always succeeds. `timeout` is accepted for interface compatibility;
    /// closing is best effort and immediate.
    pub fn abort(&mut self, _timeout: Duration) -> bool {
        self.session.begin_attempt();
        self.cancel_reconnect();
        self.discard_socket();
        true
    }

    /// Abort followed by a fresh start
    pub fn retry(&mut self) -> Result<()> {
        self.abort(Duration::ZERO);
        self.start(None)
    }

    /// The owning connection gave up on the current socket
    ///
    /// Called by a keep-alive monitor when no frame arrived in time; tears the
    /// socket down and reconnects right away.
    pub fn lost_connection(&mut self) -> Result<()> {
        self.log("WebSocket: lost connection, retrying", Severity::Debug);
        self.retry()
    }

    /// Dispatch a notification from socket `id`
    ///
    /// Notifications from a socket that is no longer current are dropped.
    pub fn handle_socket_event(&mut self, id: SocketId, event: SocketEvent) {
        if self.current_socket_id() != Some(id) {
            debug!("Ignoring {:?} from stale {}", event, id);
            return;
        }

        match event {
            SocketEvent::HostFound => self.log("WebSocket: Host found", Severity::Info),
            SocketEvent::Connected => self.on_connected(),
            SocketEvent::Disconnected => self.on_disconnected(),
            SocketEvent::Error(code) => self.on_socket_error(code),
            SocketEvent::TextReceived(text) => self.on_text_received(&text),
            SocketEvent::Pong(_) => self.log("on pong", Severity::Debug),
            SocketEvent::Debug(message) => self.log(&message, Severity::Debug),
        }
    }

    /// Reconnect timer fired
    ///
    /// Only the armed cycle is acted on: the timer is stopped and detached,
    /// the connection moves to reconnecting and a new attempt starts.
    pub fn handle_timer_fired(&mut self, id: TimerId) -> Result<()> {
        if !self.retry_timer.consume(id) {
            debug!("Ignoring stale {}", id);
            return Ok(());
        }

        self.connection
            .change_state(ConnectionState::Connected, ConnectionState::Reconnecting);
        self.start(None)
    }

    fn on_connected(&mut self) {
        self.emit(TransportEvent::Started { error: None });
        self.session.mark_started();

        let configured = self.connection.protocol_version();
        let version = protocol_version_number(&configured).unwrap_or_else(|| {
            self.log(
                &format!("WebSocket: invalid protocol version '{}', using 0", configured),
                Severity::Warning,
            );
            0
        });

        let sent = match HandshakeRequest::new(version).encode() {
            Ok(frame) => self.write_handshake(&frame).then_some(frame),
            Err(e) => {
                debug!("Failed to encode handshake: {}", e);
                None
            }
        };

        match sent {
            Some(frame) => {
                self.session.handshake_sent(true);
                self.log(
                    &format!("WebSocketTransport handshake sent: {}", frame),
                    Severity::Info,
                );
            }
            None => {
                self.session.handshake_sent(false);
                let error = TransportError::operation("WebSocket write error");
                self.log(&format!("WebSocket: {}", error), Severity::Error);
                self.connection.on_error(error);
                // Let the socket's disconnect notification drive the reconnect policy
                if let Some(socket) = self.socket.as_mut() {
                    socket.close();
                }
            }
        }
    }

    fn write_handshake(&mut self, frame: &str) -> bool {
        match self.socket.as_mut() {
            Some(socket) => {
                let written = socket.write(frame);
                let flushed = socket.flush();
                written == frame.len() && flushed
            }
            None => false,
        }
    }

    fn on_disconnected(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };

        let error = classify(socket.error(), socket.error_string());
        if socket.state() == SocketState::Connected {
            socket.close();
        }
        self.session.connection_lost();

        self.log(&format!("WebSocket: disconnected: {}", error), Severity::Error);
        self.connection.on_error(error);

        if self.connection.ensure_reconnecting() || self.connection.auto_reconnect() {
            self.schedule_reconnect();
        } else {
            self.log(
                "WebSocket: lost connection, automatic reconnect disabled",
                Severity::Info,
            );
        }
    }

    fn schedule_reconnect(&mut self) {
        let wait = self.connection.reconnect_wait_time();
        match self.retry_timer.arm(wait, self.scheduler.as_mut()) {
            Some(id) => {
                self.log(
                    &format!(
                        "WebSocket: lost connection, try to reconnect in {}ms",
                        wait.as_millis()
                    ),
                    Severity::Debug,
                );
                debug!("Armed {}", id);
            }
            None => debug!("Reconnect already pending, not arming another timer"),
        }
    }

    fn on_socket_error(&mut self, code: SocketErrorCode) {
        let message = self
            .socket
            .as_ref()
            .map(|socket| socket.error_string())
            .unwrap_or_default();
        let error = classify(code, message);
        self.log(&format!("WebSocket: {}", error), Severity::Error);
        self.connection.on_error(error);
    }

    fn on_text_received(&mut self, text: &str) {
        self.log(&format!("WebSocket: Message received: {}", text), Severity::Debug);
        self.connection.update_last_keep_alive();

        let state = self.connection.state();
        if state != ConnectionState::Connected {
            self.connection.change_state(state, ConnectionState::Connected);
        }

        let outcome = self.connection.process_messages(text);
        if self.session.frame_received(outcome.error.is_none()) {
            self.log("WebSocket: handshake completed", Severity::Info);
            self.emit(TransportEvent::HandshakeCompleted);
        }

        if let Some(ref error) = outcome.error {
            self.log(&format!("WebSocket: {}", error), Severity::Error);
            self.connection.on_error(error.clone());
        }
        if outcome.disconnected {
            self.log("WebSocket: server requested disconnect", Severity::Info);
        }
        if outcome.timed_out {
            self.log("WebSocket: server reported timeout", Severity::Info);
        }

        self.emit(TransportEvent::FrameProcessed {
            error: outcome.error,
            message_id: outcome.message_id,
        });
    }

    fn cancel_reconnect(&mut self) {
        if self.retry_timer.cancel(self.scheduler.as_mut()) {
            self.log("WebSocket: pending reconnect cancelled", Severity::Debug);
        }
    }

    fn discard_socket(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.close();
            debug!("Discarded {}", socket.id());
        }
    }

    fn emit(&self, event: TransportEvent) {
        // The transport holds a receiver, so this cannot fail
        let _ = self.event_tx.send(event);
    }

    fn log(&self, message: &str, severity: Severity) {
        self.connection.emit_log_message(message, severity);
    }
}
