//! Common test utilities for HubSockets integration tests
//!
//! Fakes for every collaborator of the transport state machine, plus a mock
//! hub server for end-to-end runs over real sockets.

#![allow(dead_code)]

use hubsockets::connection_state::ConnectionState;
use hubsockets::traits::*;
use hubsockets::transport::{TransportEvent, WebSocketTransport};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use url::Url;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

// ---------------------------------------------------------------------------
// Owning connection
// ---------------------------------------------------------------------------

/// Knobs of the fake owning connection
#[derive(Debug, Clone)]
pub struct FakeConfig {
    pub url: String,
    pub protocol_version: String,
    pub auto_reconnect: bool,
    pub ensure_reconnecting: bool,
    pub wait: Duration,
    pub context_paths: bool,
    pub default_query: bool,
    pub query_string: String,
    pub extra_query: Vec<(String, String)>,
    pub headers: Headers,
    /// Error returned by `process_messages` for every frame
    pub frame_error: Option<TransportError>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            url: "http://host/hub".to_string(),
            protocol_version: "1".to_string(),
            auto_reconnect: false,
            ensure_reconnecting: false,
            wait: Duration::from_millis(1000),
            context_paths: true,
            default_query: false,
            query_string: "?transport=webSockets".to_string(),
            extra_query: Vec::new(),
            headers: Headers::new(),
            frame_error: None,
        }
    }
}

/// Everything the transport told the connection
#[derive(Debug, Default)]
pub struct ConnectionRecord {
    pub logs: Vec<(String, Severity)>,
    pub errors: Vec<TransportError>,
    pub state_changes: Vec<(ConnectionState, ConnectionState)>,
    pub retry_time_updates: usize,
    pub keep_alive_updates: usize,
    pub frames: Vec<String>,
}

pub struct FakeConnection {
    pub config: Mutex<FakeConfig>,
    pub state: Mutex<ConnectionState>,
    pub record: Mutex<ConnectionRecord>,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Self::with(|_| {})
    }

    pub fn with(configure: impl FnOnce(&mut FakeConfig)) -> Arc<Self> {
        let mut config = FakeConfig::default();
        configure(&mut config);
        Arc::new(Self {
            config: Mutex::new(config),
            state: Mutex::new(ConnectionState::Connecting),
            record: Mutex::new(ConnectionRecord::default()),
        })
    }

    pub fn errors(&self) -> Vec<TransportError> {
        self.record.lock().errors.clone()
    }

    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.record.lock().errors.iter().map(|e| e.kind).collect()
    }

    pub fn logs_at(&self, severity: Severity) -> Vec<String> {
        self.record
            .lock()
            .logs
            .iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn state_changes(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.record.lock().state_changes.clone()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }
}

impl Connection for FakeConnection {
    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn change_state(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let mut state = self.state.lock();
        if *state != from {
            return false;
        }
        *state = to;
        self.record.lock().state_changes.push((from, to));
        true
    }

    fn auto_reconnect(&self) -> bool {
        self.config.lock().auto_reconnect
    }

    fn ensure_reconnecting(&self) -> bool {
        self.config.lock().ensure_reconnecting
    }

    fn reconnect_wait_time(&self) -> Duration {
        self.config.lock().wait
    }

    fn protocol_version(&self) -> String {
        self.config.lock().protocol_version.clone()
    }

    fn web_sockets_url(&self) -> String {
        self.config.lock().url.clone()
    }

    fn use_default_context_paths(&self) -> bool {
        self.config.lock().context_paths
    }

    fn use_default_query_string(&self) -> bool {
        self.config.lock().default_query
    }

    fn receive_query_string(&self, _transport_type: &str) -> String {
        self.config.lock().query_string.clone()
    }

    fn additional_query_string(&self) -> Vec<(String, String)> {
        self.config.lock().extra_query.clone()
    }

    fn additional_headers(&self) -> Headers {
        self.config.lock().headers.clone()
    }

    fn emit_log_message(&self, message: &str, severity: Severity) {
        verbose_println!("[{}] {}", severity, message);
        self.record.lock().logs.push((message.to_string(), severity));
    }

    fn on_error(&self, error: TransportError) {
        self.record.lock().errors.push(error);
    }

    fn update_last_retry_time(&self) {
        self.record.lock().retry_time_updates += 1;
    }

    fn update_last_keep_alive(&self) {
        self.record.lock().keep_alive_updates += 1;
    }

    fn process_messages(&self, frame: &str) -> FrameOutcome {
        self.record.lock().frames.push(frame.to_string());
        match self.config.lock().frame_error.clone() {
            Some(error) => FrameOutcome::failed(error),
            None => FrameOutcome::ok(7),
        }
    }
}

// ---------------------------------------------------------------------------
// Sockets
// ---------------------------------------------------------------------------

/// Observable state of one fake socket
#[derive(Debug)]
pub struct FakeSocketState {
    pub id: SocketId,
    pub opened_url: Option<String>,
    pub headers: Headers,
    pub writes: Vec<String>,
    pub close_calls: usize,
    pub state: SocketState,
    pub error: SocketErrorCode,
    pub error_string: String,
    /// Cap on bytes accepted per write
    pub write_limit: Option<usize>,
    pub flush_ok: bool,
}

impl FakeSocketState {
    fn new(id: SocketId, write_limit: Option<usize>, flush_ok: bool) -> Self {
        Self {
            id,
            opened_url: None,
            headers: Headers::new(),
            writes: Vec::new(),
            close_calls: 0,
            state: SocketState::Unconnected,
            error: SocketErrorCode::Unknown,
            error_string: "Unknown error".to_string(),
            write_limit,
            flush_ok,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls > 0
    }
}

pub type SharedFakeSocket = Arc<Mutex<FakeSocketState>>;

pub struct FakeSocket {
    id: SocketId,
    shared: SharedFakeSocket,
}

impl Socket for FakeSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    fn set_additional_headers(&mut self, headers: &Headers) {
        self.shared.lock().headers = headers.clone();
    }

    fn open(&mut self, url: &Url) {
        let mut shared = self.shared.lock();
        shared.opened_url = Some(url.to_string());
        shared.state = SocketState::Connecting;
    }

    fn write(&mut self, data: &str) -> usize {
        let mut shared = self.shared.lock();
        shared.writes.push(data.to_string());
        shared.write_limit.map_or(data.len(), |limit| limit.min(data.len()))
    }

    fn flush(&mut self) -> bool {
        self.shared.lock().flush_ok
    }

    fn close(&mut self) {
        let mut shared = self.shared.lock();
        shared.close_calls += 1;
        shared.state = SocketState::Unconnected;
    }

    fn state(&self) -> SocketState {
        self.shared.lock().state
    }

    fn error(&self) -> SocketErrorCode {
        self.shared.lock().error
    }

    fn error_string(&self) -> String {
        self.shared.lock().error_string.clone()
    }
}

#[derive(Debug)]
struct SocketRegistryInner {
    sockets: Vec<SharedFakeSocket>,
    write_limit: Option<usize>,
    flush_ok: bool,
}

/// Test-side view of every socket the factory created
#[derive(Clone)]
pub struct SocketRegistry {
    inner: Arc<Mutex<SocketRegistryInner>>,
}

impl SocketRegistry {
    pub fn count(&self) -> usize {
        self.inner.lock().sockets.len()
    }

    pub fn get(&self, index: usize) -> SharedFakeSocket {
        Arc::clone(&self.inner.lock().sockets[index])
    }

    pub fn last(&self) -> SharedFakeSocket {
        let inner = self.inner.lock();
        Arc::clone(inner.sockets.last().expect("no socket created"))
    }

    /// Sockets neither closed nor never opened
    pub fn live_count(&self) -> usize {
        self.inner
            .lock()
            .sockets
            .iter()
            .filter(|s| {
                let s = s.lock();
                s.opened_url.is_some() && !s.is_closed()
            })
            .count()
    }

    /// Applies to sockets created from now on
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.inner.lock().write_limit = limit;
    }

    /// Applies to sockets created from now on
    pub fn set_flush_ok(&self, ok: bool) {
        self.inner.lock().flush_ok = ok;
    }
}

pub struct FakeSocketFactory {
    registry: SocketRegistry,
}

impl FakeSocketFactory {
    pub fn new() -> (Self, SocketRegistry) {
        let registry = SocketRegistry {
            inner: Arc::new(Mutex::new(SocketRegistryInner {
                sockets: Vec::new(),
                write_limit: None,
                flush_ok: true,
            })),
        };
        (
            Self {
                registry: registry.clone(),
            },
            registry,
        )
    }
}

impl SocketFactory for FakeSocketFactory {
    fn create(&mut self, id: SocketId) -> Box<dyn Socket> {
        let mut inner = self.registry.inner.lock();
        let state = FakeSocketState::new(id, inner.write_limit, inner.flush_ok);
        let shared = Arc::new(Mutex::new(state));
        inner.sockets.push(Arc::clone(&shared));
        Box::new(FakeSocket { id, shared })
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TimerRecord {
    pub scheduled: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
}

#[derive(Clone, Default)]
pub struct TimerRegistry {
    inner: Arc<Mutex<TimerRecord>>,
}

impl TimerRegistry {
    pub fn scheduled(&self) -> Vec<(TimerId, Duration)> {
        self.inner.lock().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.inner.lock().cancelled.clone()
    }

    pub fn last_scheduled(&self) -> TimerId {
        self.inner.lock().scheduled.last().expect("no timer scheduled").0
    }
}

pub struct FakeTimerScheduler {
    registry: TimerRegistry,
}

impl TimerScheduler for FakeTimerScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.registry.inner.lock().scheduled.push((id, delay));
    }

    fn cancel(&mut self, id: TimerId) {
        self.registry.inner.lock().cancelled.push(id);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A transport wired to fakes, with helpers that play the socket's part
pub struct Harness {
    pub transport: WebSocketTransport,
    pub connection: Arc<FakeConnection>,
    pub sockets: SocketRegistry,
    pub timers: TimerRegistry,
    pub events: crossbeam_channel::Receiver<TransportEvent>,
}

impl Harness {
    pub fn new(connection: Arc<FakeConnection>) -> Self {
        let (factory, sockets) = FakeSocketFactory::new();
        let timers = TimerRegistry::default();
        let transport = WebSocketTransport::new(
            connection.clone(),
            Box::new(factory),
            Box::new(FakeTimerScheduler {
                registry: timers.clone(),
            }),
        );
        let events = transport.events();
        Self {
            transport,
            connection,
            sockets,
            timers,
            events,
        }
    }

    pub fn current(&self) -> SocketId {
        self.transport.current_socket_id().expect("no current socket")
    }

    /// The current socket reports it connected
    pub fn connect(&mut self) {
        let id = self.current();
        self.sockets.last().lock().state = SocketState::Connected;
        self.transport.handle_socket_event(id, SocketEvent::Connected);
    }

    /// The current socket delivers a text frame
    pub fn receive(&mut self, text: &str) {
        let id = self.current();
        self.transport
            .handle_socket_event(id, SocketEvent::TextReceived(text.to_string()));
    }

    /// The current socket drops with `code`
    pub fn disconnect(&mut self, code: SocketErrorCode) {
        let id = self.current();
        {
            let socket = self.sockets.last();
            let mut socket = socket.lock();
            socket.state = SocketState::Unconnected;
            socket.error = code;
            socket.error_string = format!("{:?}", code);
        }
        self.transport.handle_socket_event(id, SocketEvent::Disconnected);
    }

    /// Start, connect and acknowledge the handshake
    pub fn establish(&mut self) {
        self.transport.start(None).unwrap();
        self.connect();
        self.receive("{}\u{1e}");
        assert!(self.transport.is_handshake_completed());
    }

    pub fn drain_events(&self) -> Vec<TransportEvent> {
        self.events.try_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Mock hub server
// ---------------------------------------------------------------------------

/// A mock hub server
///
/// Acknowledges the first frame of every connection with `{}` + record
/// separator, echoes everything after it, and records the request path of
/// each upgrade.
pub struct MockHubServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    drop_signal: Arc<Notify>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl MockHubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let drop_signal = Arc::new(Notify::new());
        let paths = Arc::new(Mutex::new(Vec::new()));

        let shutdown_clone = shutdown.clone();
        let drop_clone = drop_signal.clone();
        let paths_clone = paths.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                let drop_signal = drop_clone.clone();
                                let paths = paths_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, drop_signal, paths)
                                        .await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            drop_signal,
            paths,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        shutdown: Arc<Notify>,
        drop_signal: Arc<Notify>,
        paths: Arc<Mutex<Vec<String>>>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
        use tokio_tungstenite::tungstenite::Message;

        let record_path = |request: &Request, response: Response| {
            paths.lock().push(request.uri().to_string());
            Ok(response)
        };

        let ws_stream = match accept_hdr_async(stream, record_path).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();
        let mut acknowledged = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            if msg.is_text() || msg.is_binary() {
                                let reply = if acknowledged {
                                    msg
                                } else {
                                    acknowledged = true;
                                    Message::Text("{}\u{1e}".to_string())
                                };
                                if write.send(reply).await.is_err() {
                                    break;
                                }
                            } else if msg.is_close() {
                                break;
                            }
                        }
                        Some(Err(_)) | None => break,
                    }
                }
                _ = drop_signal.notified() => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Base URL clients should use (HTTP scheme, rewritten by the transport)
    pub fn hub_url(&self) -> String {
        format!("http://{}/hub", self.addr)
    }

    /// Upgrade request paths seen so far
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Close every open connection from the server side
    pub fn drop_connections(&self) {
        self.drop_signal.notify_waiters();
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockHubServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
