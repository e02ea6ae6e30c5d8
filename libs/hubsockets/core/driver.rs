//! Tokio runtime driver for [`WebSocketTransport`]
//!
//! # Architecture
//!
//! ```text
//!  TransportHandle ──Command──┐
//!  Socket tasks ────Socket────┼──> inbox ──> driver task ──> WebSocketTransport
//!  Timer tasks ─────TimerFired┘                                   │
//!                                              TransportEvent <──┘
//! ```
//!
//! The driver task is the single execution context of the state machine:
//! every socket notification, timer fire and caller command goes through one
//! inbox and is handled to completion before the next one.

use crate::transport::{TransportEvent, WebSocketTransport};
use crate::traits::*;
use crate::ws_socket::TungsteniteSocketFactory;
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Everything the driver task reacts to
#[derive(Debug)]
pub enum DriverEvent {
    /// Notification from a socket
    Socket(SocketId, SocketEvent),
    /// A scheduled reconnect timer elapsed
    TimerFired(TimerId),
    /// Request from the [`TransportHandle`]
    Command(TransportCommand),
}

/// Caller requests
#[derive(Debug)]
pub enum TransportCommand {
    Start(Option<String>),
    Send(String),
    Abort(Duration, oneshot::Sender<bool>),
    Retry,
    LostConnection,
    IsHandshakeCompleted(oneshot::Sender<bool>),
    Shutdown,
}

/// [`TimerScheduler`] backed by `tokio::time::sleep` tasks
pub struct TokioTimerScheduler {
    events: mpsc::UnboundedSender<DriverEvent>,
    pending: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimerScheduler {
    pub fn new(events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            events,
            pending: HashMap::new(),
        }
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.pending.retain(|_, handle| !handle.is_finished());

        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(DriverEvent::TimerFired(id));
        });
        self.pending.insert(id, handle);
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.pending.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimerScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

/// Handle to a transport running on its own driver task
pub struct TransportHandle {
    inbox: mpsc::UnboundedSender<DriverEvent>,
    event_rx: Receiver<TransportEvent>,
    task_handle: Option<JoinHandle<()>>,
}

/// Spawn a WebSocket transport for `connection`
///
/// Must be called from within a Tokio runtime. The transport stays idle
/// until [`TransportHandle::start`] is called.
pub fn spawn_transport(connection: Arc<dyn Connection>) -> TransportHandle {
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

    let transport = WebSocketTransport::new(
        connection,
        Box::new(TungsteniteSocketFactory::new(inbox_tx.clone())),
        Box::new(TokioTimerScheduler::new(inbox_tx.clone())),
    );
    let event_rx = transport.events();

    let task_handle = tokio::spawn(run_transport(transport, inbox_rx));

    TransportHandle {
        inbox: inbox_tx,
        event_rx,
        task_handle: Some(task_handle),
    }
}

impl TransportHandle {
    fn command(&self, command: TransportCommand) -> Result<()> {
        self.inbox
            .send(DriverEvent::Command(command))
            .map_err(|e| HubSocketError::ChannelSend(e.to_string()))
    }

    /// Open a new connection, replacing any existing one
    pub fn start(&self, hint: Option<String>) -> Result<()> {
        self.command(TransportCommand::Start(hint))
    }

    /// Write one frame on the current socket
    pub fn send(&self, payload: impl Into<String>) -> Result<()> {
        self.command(TransportCommand::Send(payload.into()))
    }

    /// Close the current socket and cancel any pending reconnect
    pub async fn abort(&self, timeout: Duration) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.command(TransportCommand::Abort(timeout, tx))?;
        rx.await
            .map_err(|e| HubSocketError::ChannelReceive(e.to_string()))
    }

    pub fn retry(&self) -> Result<()> {
        self.command(TransportCommand::Retry)
    }

    /// Tear down a connection that went silent and reconnect
    pub fn lost_connection(&self) -> Result<()> {
        self.command(TransportCommand::LostConnection)
    }

    pub async fn is_handshake_completed(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.command(TransportCommand::IsHandshakeCompleted(tx))?;
        rx.await
            .map_err(|e| HubSocketError::ChannelReceive(e.to_string()))
    }

    /// Receiver for transport notifications
    pub fn events(&self) -> Receiver<TransportEvent> {
        self.event_rx.clone()
    }

    /// Try to receive a notification (non-blocking)
    pub fn try_recv_event(&self) -> Option<TransportEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Abort the transport and wait for the driver task to exit
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down WebSocket transport");
        let _ = self.command(TransportCommand::Shutdown);
        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| HubSocketError::WebSocket(format!("driver task failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        // The transport keeps inbox senders alive, so the driver only exits on request
        let _ = self.inbox.send(DriverEvent::Command(TransportCommand::Shutdown));
    }
}

/// Driver task loop
async fn run_transport(
    mut transport: WebSocketTransport,
    mut inbox: mpsc::UnboundedReceiver<DriverEvent>,
) {
    while let Some(event) = inbox.recv().await {
        match event {
            DriverEvent::Socket(id, event) => transport.handle_socket_event(id, event),
            DriverEvent::TimerFired(id) => {
                if let Err(e) = transport.handle_timer_fired(id) {
                    error!("Reconnect attempt failed to start: {}", e);
                }
            }
            DriverEvent::Command(command) => match command {
                TransportCommand::Start(hint) => {
                    if let Err(e) = transport.start(hint.as_deref()) {
                        error!("Failed to start transport: {}", e);
                    }
                }
                TransportCommand::Send(payload) => transport.send(&payload),
                TransportCommand::Abort(timeout, reply) => {
                    let _ = reply.send(transport.abort(timeout));
                }
                TransportCommand::Retry => {
                    if let Err(e) = transport.retry() {
                        error!("Failed to retry transport: {}", e);
                    }
                }
                TransportCommand::LostConnection => {
                    if let Err(e) = transport.lost_connection() {
                        error!("Failed to reconnect lost transport: {}", e);
                    }
                }
                TransportCommand::IsHandshakeCompleted(reply) => {
                    let _ = reply.send(transport.is_handshake_completed());
                }
                TransportCommand::Shutdown => {
                    transport.abort(Duration::ZERO);
                    break;
                }
            },
        }
    }

    debug!("Transport driver exiting");
}
