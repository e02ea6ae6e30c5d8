//! Maps socket error codes onto the transport error taxonomy

use crate::traits::{ErrorKind, SocketErrorCode, TransportError};
use std::io;
use tokio_tungstenite::tungstenite;

/// Classify a socket error code and message
///
/// Total over [`SocketErrorCode`]: every code, including `Other`, yields a
/// record. Only the remote-closed, refused and generic network conditions keep
/// a dedicated kind.
pub fn classify(code: SocketErrorCode, message: impl Into<String>) -> TransportError {
    TransportError::new(kind_for(code), message)
}

/// Error kind for a socket error code
pub fn kind_for(code: SocketErrorCode) -> ErrorKind {
    match code {
        SocketErrorCode::RemoteHostClosed => ErrorKind::RemoteHostClosedConnection,
        SocketErrorCode::ConnectionRefused => ErrorKind::ConnectionRefused,
        SocketErrorCode::Network => ErrorKind::UnknownNetworkError,
        SocketErrorCode::SocketAccess
        | SocketErrorCode::SocketResource
        | SocketErrorCode::SocketTimeout
        | SocketErrorCode::DatagramTooLarge
        | SocketErrorCode::AddressInUse
        | SocketErrorCode::SocketAddressNotAvailable
        | SocketErrorCode::UnsupportedSocketOperation
        | SocketErrorCode::UnfinishedSocketOperation
        | SocketErrorCode::ProxyAuthenticationRequired
        | SocketErrorCode::TlsHandshakeFailed
        | SocketErrorCode::ProxyConnectionRefused
        | SocketErrorCode::ProxyConnectionClosed
        | SocketErrorCode::ProxyConnectionTimeout
        | SocketErrorCode::ProxyNotFound
        | SocketErrorCode::ProxyProtocol
        | SocketErrorCode::Unknown
        | SocketErrorCode::HostNotFound
        | SocketErrorCode::Operation
        | SocketErrorCode::TlsInternal
        | SocketErrorCode::TlsInvalidUserData
        | SocketErrorCode::Temporary
        | SocketErrorCode::Other(_) => ErrorKind::UnknownError,
    }
}

/// Translate a tungstenite failure into a socket error code and message
pub fn classify_ws_error(err: &tungstenite::Error) -> (SocketErrorCode, String) {
    let code = match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            SocketErrorCode::RemoteHostClosed
        }
        tungstenite::Error::Io(io_err) => io_error_code(io_err),
        tungstenite::Error::Tls(_) => SocketErrorCode::TlsHandshakeFailed,
        tungstenite::Error::Capacity(_) => SocketErrorCode::DatagramTooLarge,
        tungstenite::Error::Url(_) => SocketErrorCode::HostNotFound,
        tungstenite::Error::Protocol(_) => SocketErrorCode::Operation,
        _ => SocketErrorCode::Unknown,
    };
    (code, err.to_string())
}

fn io_error_code(err: &io::Error) -> SocketErrorCode {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => SocketErrorCode::ConnectionRefused,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => SocketErrorCode::RemoteHostClosed,
        io::ErrorKind::TimedOut => SocketErrorCode::SocketTimeout,
        io::ErrorKind::PermissionDenied => SocketErrorCode::SocketAccess,
        io::ErrorKind::AddrInUse => SocketErrorCode::AddressInUse,
        io::ErrorKind::AddrNotAvailable => SocketErrorCode::SocketAddressNotAvailable,
        io::ErrorKind::Unsupported => SocketErrorCode::UnsupportedSocketOperation,
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => SocketErrorCode::Temporary,
        io::ErrorKind::OutOfMemory => SocketErrorCode::SocketResource,
        _ => SocketErrorCode::Network,
    }
}
