use std::fmt;
use thiserror::Error;

/// Main error type for hubsockets
#[derive(Error, Debug)]
pub enum HubSocketError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connect URL could not be built or parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Channel receive error
    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payload serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for hubsockets operations
pub type Result<T> = std::result::Result<T, HubSocketError>;

/// Closed set of transport failure kinds surfaced to the owning connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The remote peer closed the connection
    RemoteHostClosedConnection,
    /// The remote peer actively refused the connection
    ConnectionRefused,
    /// Generic network failure
    UnknownNetworkError,
    /// Every other socket condition
    UnknownError,
    /// Local write or flush failure while sending the handshake
    OperationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RemoteHostClosedConnection => "RemoteHostClosedConnection",
            ErrorKind::ConnectionRefused => "ConnectionRefused",
            ErrorKind::UnknownNetworkError => "UnknownNetworkError",
            ErrorKind::UnknownError => "UnknownError",
            ErrorKind::OperationError => "OperationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified transport failure
///
/// Produced by the classifier from raw socket error codes, or directly by the
/// transport for a failed handshake write. Consumed by the owning
/// connection's error sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Local write failure while sending the handshake frame
    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(ErrorKind::ConnectionRefused, "port closed");
        assert_eq!(err.to_string(), "ConnectionRefused: port closed");
    }

    #[test]
    fn test_operation_error_kind() {
        let err = TransportError::operation("WebSocket write error");
        assert_eq!(err.kind, ErrorKind::OperationError);
        assert_eq!(err.message, "WebSocket write error");
    }
}
