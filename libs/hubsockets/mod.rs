//! # HubSockets
//!
//! Client-side WebSocket transport for a push-oriented hub messaging protocol.
//!
//! ## Features
//!
//! - **Handshake before data**: a versioned handshake frame is sent on connect
//!   and the first inbound frame is taken as its acknowledgement
//! - **Stable error taxonomy**: socket failures are classified into a small closed set
//! - **Policy-driven reconnect**: one single-shot timer per lost connection, never stacked
//! - **Testable core**: the state machine talks to sockets, timers and the owning
//!   connection only through traits

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, classifier, config, connect_url, connection_state, driver, handshake, hub_connection,
    liveness, retry_timer, session, transport, ws_socket,
    builder::{states, HubConnectionBuilder},
    config::{HubConfig, QueryParam},
    connection_state::{AtomicConnectionState, ConnectionState},
    driver::{spawn_transport, TransportHandle},
    hub_connection::HubConnection,
    liveness::LivenessTracker,
    transport::{TransportEvent, WebSocketTransport, TRANSPORT_TYPE},
};

// Convenience function
pub use self::core::builder as connection_builder;
