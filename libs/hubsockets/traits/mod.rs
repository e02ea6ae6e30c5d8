//! # HubSockets Traits
//!
//! Seams between the transport state machine and its collaborators:
//!
//! - **Connection**: the owning connection (policy, URLs, sinks, message processing)
//! - **Socket / SocketFactory**: the raw full-duplex socket, one per attempt
//! - **TimerScheduler**: the clock behind the reconnect timer
//! - **TransportError / ErrorKind**: the classified error taxonomy
//!
//! Everything here can be replaced by a fake, which is how the state machine
//! is tested without a network.

pub mod connection;
pub mod error;
pub mod socket;
pub mod timer;

// Re-export commonly used types
pub use connection::{Connection, FrameOutcome, Severity};
pub use error::{ErrorKind, HubSocketError, Result, TransportError};
pub use socket::{
    Headers, Socket, SocketErrorCode, SocketEvent, SocketFactory, SocketId, SocketState,
};
pub use timer::{TimerId, TimerScheduler};
