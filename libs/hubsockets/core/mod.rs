//! # HubSockets core
//!
//! The connection-lifecycle state machine and everything needed to run it:
//!
//! - **transport**: handshake sequencing, disconnect handling, reconnect scheduling
//! - **session / retry_timer**: the explicit handshake state and single-shot reconnect timer
//! - **classifier**: socket error codes to the transport error taxonomy
//! - **hub_connection / builder / config**: a default owning connection
//! - **driver / ws_socket**: the Tokio + tokio-tungstenite runtime
//!
//! ## Example
//!
//! ```rust,ignore
//! use hubsockets::{builder, spawn_transport, TransportEvent};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> hubsockets::Result<()> {
//!     let connection = Arc::new(
//!         builder()
//!             .url("https://example.com/hub")
//!             .reconnect_wait(Duration::from_secs(2))
//!             .build(),
//!     );
//!
//!     let transport = spawn_transport(connection.clone());
//!     transport.start(None)?;
//!
//!     while let Ok(event) = transport.events().recv() {
//!         if event == TransportEvent::HandshakeCompleted {
//!             transport.send("{\"type\":6}\u{1e}")?;
//!         }
//!     }
//!
//!     transport.shutdown().await
//! }
//! ```

pub mod builder;
pub mod classifier;
pub mod config;
pub mod connect_url;
pub mod connection_state;
pub mod driver;
pub mod handshake;
pub mod hub_connection;
pub mod liveness;
pub mod retry_timer;
pub mod session;
pub mod transport;
pub mod ws_socket;

// Re-export main types
pub use builder::{states, HubConnectionBuilder};
pub use classifier::classify;
pub use config::{HubConfig, QueryParam};
pub use connection_state::{AtomicConnectionState, ConnectionState};
pub use driver::{spawn_transport, DriverEvent, TransportCommand, TransportHandle};
pub use handshake::{HandshakeRequest, RECORD_SEPARATOR};
pub use hub_connection::HubConnection;
pub use liveness::LivenessTracker;
pub use transport::{TransportEvent, WebSocketTransport, TRANSPORT_TYPE};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new hub connection builder
///
/// # Example
/// ```ignore
/// let connection = hubsockets::builder()
///     .url("https://example.com/hub")
///     .protocol_version("1")
///     .auto_reconnect(true)
///     .build();
/// ```
pub fn builder() -> HubConnectionBuilder<builder::states::NoUrl> {
    HubConnectionBuilder::new()
}
