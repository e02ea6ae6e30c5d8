//! Connection state shared between the transport and the owning connection

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Transport-independent state of the owning connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Reconnecting = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
        };
        f.write_str(name)
    }
}

/// Lock-free holder for a [`ConnectionState`]
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Atomically move from `current` to `new`
    ///
    /// Returns the previous state on success, or the actual state on failure.
    pub fn compare_exchange(
        &self,
        current: ConnectionState,
        new: ConnectionState,
    ) -> Result<ConnectionState, ConnectionState> {
        self.inner
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(ConnectionState::from_u8)
            .map_err(ConnectionState::from_u8)
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        state.set(ConnectionState::Connected);
        assert_eq!(state.get(), ConnectionState::Connected);
        assert!(state.is_connected());
    }

    #[test]
    fn test_compare_exchange() {
        let state = AtomicConnectionState::new(ConnectionState::Connected);

        assert_eq!(
            state.compare_exchange(ConnectionState::Connected, ConnectionState::Reconnecting),
            Ok(ConnectionState::Connected)
        );
        assert_eq!(
            state.compare_exchange(ConnectionState::Connected, ConnectionState::Reconnecting),
            Err(ConnectionState::Reconnecting)
        );
        assert_eq!(state.get(), ConnectionState::Reconnecting);
    }
}
