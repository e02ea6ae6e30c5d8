use std::collections::HashMap;
use std::fmt;
use url::Url;

/// HTTP headers to send with the WebSocket upgrade request
pub type Headers = HashMap<String, String>;

/// Identifies one socket instance
///
/// Every (re)start creates a socket with a fresh id. Notifications carry the
/// id of the socket that produced them so the transport can drop events from
/// a socket it has already replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Low-level socket state as reported by the socket itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SocketState {
    Unconnected = 0,
    Connecting = 1,
    Connected = 2,
    Closing = 3,
}

impl From<u8> for SocketState {
    fn from(value: u8) -> Self {
        match value {
            1 => SocketState::Connecting,
            2 => SocketState::Connected,
            3 => SocketState::Closing,
            _ => SocketState::Unconnected,
        }
    }
}

/// Socket error codes a socket implementation can report
///
/// `Other` carries codes this crate does not know about; they are classified
/// like every other unrecognised condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketErrorCode {
    RemoteHostClosed,
    ConnectionRefused,
    Network,
    SocketAccess,
    SocketResource,
    SocketTimeout,
    DatagramTooLarge,
    AddressInUse,
    SocketAddressNotAvailable,
    UnsupportedSocketOperation,
    UnfinishedSocketOperation,
    ProxyAuthenticationRequired,
    TlsHandshakeFailed,
    ProxyConnectionRefused,
    ProxyConnectionClosed,
    ProxyConnectionTimeout,
    ProxyNotFound,
    ProxyProtocol,
    Unknown,
    HostNotFound,
    Operation,
    TlsInternal,
    TlsInvalidUserData,
    Temporary,
    Other(i32),
}

impl SocketErrorCode {
    /// Every enumerated code except `Other`
    pub const ALL: [SocketErrorCode; 24] = [
        SocketErrorCode::RemoteHostClosed,
        SocketErrorCode::ConnectionRefused,
        SocketErrorCode::Network,
        SocketErrorCode::SocketAccess,
        SocketErrorCode::SocketResource,
        SocketErrorCode::SocketTimeout,
        SocketErrorCode::DatagramTooLarge,
        SocketErrorCode::AddressInUse,
        SocketErrorCode::SocketAddressNotAvailable,
        SocketErrorCode::UnsupportedSocketOperation,
        SocketErrorCode::UnfinishedSocketOperation,
        SocketErrorCode::ProxyAuthenticationRequired,
        SocketErrorCode::TlsHandshakeFailed,
        SocketErrorCode::ProxyConnectionRefused,
        SocketErrorCode::ProxyConnectionClosed,
        SocketErrorCode::ProxyConnectionTimeout,
        SocketErrorCode::ProxyNotFound,
        SocketErrorCode::ProxyProtocol,
        SocketErrorCode::Unknown,
        SocketErrorCode::HostNotFound,
        SocketErrorCode::Operation,
        SocketErrorCode::TlsInternal,
        SocketErrorCode::TlsInvalidUserData,
        SocketErrorCode::Temporary,
    ];
}

/// Notifications a socket delivers to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Host name resolved
    HostFound,
    /// Upgrade completed, frames can flow
    Connected,
    /// Connection closed, for whatever reason
    Disconnected,
    /// Socket-level error
    Error(SocketErrorCode),
    /// Inbound text frame
    TextReceived(String),
    /// Pong frame with its payload
    Pong(Vec<u8>),
    /// Diagnostic message from the socket implementation
    Debug(String),
}

/// A single full-duplex socket
///
/// Owned exclusively by the transport for one connection attempt. All
/// methods are synchronous: `open` only issues the request, and the outcome
/// arrives later as [`SocketEvent`]s.
pub trait Socket: Send {
    /// Identifier assigned by the factory
    fn id(&self) -> SocketId;

    /// Headers attached to the upgrade request
    fn set_additional_headers(&mut self, headers: &Headers);

    /// Begin connecting to `url`
    fn open(&mut self, url: &Url);

    /// Write one text frame, returning the number of bytes accepted
    fn write(&mut self, data: &str) -> usize;

    /// Flush pending writes, returning false if the socket cannot write
    fn flush(&mut self) -> bool;

    /// Close the connection (best effort, never fails)
    fn close(&mut self);

    fn state(&self) -> SocketState;

    /// Last error reported by the socket
    fn error(&self) -> SocketErrorCode;

    /// Human-readable form of the last error
    fn error_string(&self) -> String;
}

/// Creates a fresh socket for every connection attempt
pub trait SocketFactory: Send {
    fn create(&mut self, id: SocketId) -> Box<dyn Socket>;
}
