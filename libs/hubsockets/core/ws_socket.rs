//! [`Socket`] implementation over tokio-tungstenite
//!
//! `open` spawns one Tokio task per socket. The task resolves the host,
//! connects, performs the WebSocket upgrade, then multiplexes inbound frames
//! and outbound writes with `tokio::select!`. Every notification is posted to
//! the driver inbox tagged with the socket id.

use crate::classifier::classify_ws_error;
use crate::driver::DriverEvent;
use crate::traits::*;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{self, http, Message};
use tracing::{debug, warn};
use url::Url;

/// State and last error, shared between the socket and its task
struct SharedSocketState {
    state: AtomicU8,
    last_error: Mutex<(SocketErrorCode, String)>,
}

impl SharedSocketState {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(SocketState::Unconnected as u8),
            last_error: Mutex::new((SocketErrorCode::Unknown, "Unknown error".to_string())),
        }
    }

    fn state(&self) -> SocketState {
        SocketState::from(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SocketState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn set_error(&self, code: SocketErrorCode, message: impl Into<String>) {
        *self.last_error.lock() = (code, message.into());
    }
}

/// Creates [`TungsteniteSocket`]s that report to a driver inbox
pub struct TungsteniteSocketFactory {
    events: mpsc::UnboundedSender<DriverEvent>,
}

impl TungsteniteSocketFactory {
    pub fn new(events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self { events }
    }
}

impl SocketFactory for TungsteniteSocketFactory {
    fn create(&mut self, id: SocketId) -> Box<dyn Socket> {
        Box::new(TungsteniteSocket::new(id, self.events.clone()))
    }
}

pub struct TungsteniteSocket {
    id: SocketId,
    events: mpsc::UnboundedSender<DriverEvent>,
    headers: Headers,
    shared: Arc<SharedSocketState>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    task: Option<JoinHandle<()>>,
}

impl TungsteniteSocket {
    pub fn new(id: SocketId, events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            id,
            events,
            headers: Headers::new(),
            shared: Arc::new(SharedSocketState::new()),
            outbound: None,
            task: None,
        }
    }

    fn notify(&self, event: SocketEvent) {
        let _ = self.events.send(DriverEvent::Socket(self.id, event));
    }
}

impl Socket for TungsteniteSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    fn set_additional_headers(&mut self, headers: &Headers) {
        self.headers = headers.clone();
    }

    fn open(&mut self, url: &Url) {
        let request = match build_request(url, &self.headers) {
            Ok(request) => request,
            Err(e) => {
                let (code, message) = classify_ws_error(&e);
                self.shared.set_error(code, message);
                self.notify(SocketEvent::Error(code));
                self.notify(SocketEvent::Disconnected);
                return;
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.outbound = Some(outbound_tx);
        self.shared.set_state(SocketState::Connecting);

        let task = tokio::spawn(run_socket(
            self.id,
            url.clone(),
            request,
            Arc::clone(&self.shared),
            self.events.clone(),
            outbound_rx,
        ));
        self.task = Some(task);
    }

    fn write(&mut self, data: &str) -> usize {
        if self.shared.state() != SocketState::Connected {
            return 0;
        }
        match self.outbound {
            Some(ref tx) if tx.send(Message::Text(data.to_string())).is_ok() => data.len(),
            _ => 0,
        }
    }

    fn flush(&mut self) -> bool {
        // Writes are handed to the socket task as soon as they are queued
        self.outbound.as_ref().map_or(false, |tx| !tx.is_closed())
    }

    fn close(&mut self) {
        match self.shared.state() {
            SocketState::Connected => {
                if let Some(tx) = self.outbound.take() {
                    let _ = tx.send(Message::Close(None));
                }
                self.shared.set_state(SocketState::Closing);
            }
            SocketState::Closing => {}
            SocketState::Connecting | SocketState::Unconnected => {
                self.outbound = None;
                if let Some(task) = self.task.take() {
                    task.abort();
                }
                self.shared.set_state(SocketState::Unconnected);
            }
        }
    }

    fn state(&self) -> SocketState {
        self.shared.state()
    }

    fn error(&self) -> SocketErrorCode {
        self.shared.last_error.lock().0
    }

    fn error_string(&self) -> String {
        self.shared.last_error.lock().1.clone()
    }
}

impl Drop for TungsteniteSocket {
    fn drop(&mut self) {
        // A closing socket is left to finish sending its close frame
        if self.shared.state() != SocketState::Closing {
            if let Some(task) = self.task.take() {
                task.abort();
            }
        }
    }
}

/// Build the upgrade request with additional headers applied
fn build_request(url: &Url, headers: &Headers) -> tungstenite::Result<Request> {
    let mut request = url.as_str().into_client_request()?;
    for (key, value) in headers {
        match key.parse::<http::header::HeaderName>() {
            Ok(header_name) => match value.parse::<http::header::HeaderValue>() {
                Ok(header_value) => {
                    request.headers_mut().insert(header_name, header_value);
                }
                Err(_) => {
                    warn!("Invalid header value for key '{}': {}", key, value);
                }
            },
            Err(_) => {
                warn!("Invalid header name: {}", key);
            }
        }
    }
    Ok(request)
}

async fn resolve(url: &Url) -> Option<Vec<SocketAddr>> {
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(format!("{}:{}", host, port))
        .await
        .ok()?
        .collect();
    (!addrs.is_empty()).then_some(addrs)
}

/// Socket task: connect, then pump frames until either side closes
async fn run_socket(
    id: SocketId,
    url: Url,
    request: Request,
    shared: Arc<SharedSocketState>,
    events: mpsc::UnboundedSender<DriverEvent>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let notify = |event: SocketEvent| {
        let _ = events.send(DriverEvent::Socket(id, event));
    };
    let fail = |code: SocketErrorCode, message: String| {
        shared.set_error(code, message);
        shared.set_state(SocketState::Unconnected);
        notify(SocketEvent::Error(code));
        notify(SocketEvent::Disconnected);
    };

    let Some(addrs) = resolve(&url).await else {
        fail(
            SocketErrorCode::HostNotFound,
            format!("Host {} not found", url.host_str().unwrap_or_default()),
        );
        return;
    };
    notify(SocketEvent::HostFound);

    let stream = match TcpStream::connect(&addrs[..]).await {
        Ok(stream) => stream,
        Err(e) => {
            let (code, message) = classify_ws_error(&tungstenite::Error::Io(e));
            fail(code, message);
            return;
        }
    };
    notify(SocketEvent::Debug(format!("TCP connection to {} established", url)));

    let ws_stream = match tokio_tungstenite::client_async_tls(request, stream).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            let (code, message) = classify_ws_error(&e);
            fail(code, message);
            return;
        }
    };

    shared.set_state(SocketState::Connected);
    notify(SocketEvent::Connected);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => notify(SocketEvent::TextReceived(text)),
                    Some(Ok(Message::Binary(data))) => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        notify(SocketEvent::TextReceived(text))
                    }
                    Some(Ok(Message::Pong(payload))) => notify(SocketEvent::Pong(payload)),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|frame| frame.reason.into_owned())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "Remote host closed the connection".to_string());
                        shared.set_error(SocketErrorCode::RemoteHostClosed, reason);
                        break;
                    }
                    // Pings are answered by tungstenite itself
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        let (code, message) = classify_ws_error(&e);
                        shared.set_error(code, message);
                        notify(SocketEvent::Error(code));
                        break;
                    }
                    None => {
                        shared.set_error(SocketErrorCode::RemoteHostClosed, "Stream ended");
                        break;
                    }
                }
            }

            out = outbound.recv() => {
                match out {
                    Some(Message::Close(frame)) => {
                        let _ = write.send(Message::Close(frame)).await;
                        debug!("{} closed by client", id);
                        break;
                    }
                    Some(msg) => {
                        if let Err(e) = write.send(msg).await {
                            let (code, message) = classify_ws_error(&e);
                            shared.set_error(code, message);
                            notify(SocketEvent::Error(code));
                            break;
                        }
                    }
                    // Socket handle dropped without a close
                    None => break,
                }
            }
        }
    }

    shared.set_state(SocketState::Unconnected);
    notify(SocketEvent::Disconnected);
}
