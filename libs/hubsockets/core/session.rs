//! Handshake state of one transport session
//!
//! Socket notifications arrive as independent callbacks. Every one of them
//! moves this struct through an explicit transition function instead of
//! flipping flags ad hoc, so the handshake rules can be tested without a socket.
//!
//! ```text
//!            handshake_sent(true)            frame_received(true)
//!   Idle ─────────────────────────> AwaitingAck ──────────────────────> Completed
//!    ^                                   │
//!    │        frame_received(_) / handshake_sent(false)
//!    └───────────────────────────────────┘
//!
//!   begin_attempt / connection_lost: any state ──> Idle
//! ```

/// Where the current session is in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// No handshake outstanding
    #[default]
    Idle,
    /// Handshake frame written, waiting for the first inbound frame
    AwaitingAck,
    /// First frame after the handshake was processed without error
    Completed,
}

#[derive(Debug, Clone, Default)]
pub struct TransportSession {
    handshake: HandshakeState,
    /// Set once any connection has been established; selects `/reconnect`
    started: bool,
}

impl TransportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake
    }

    pub fn is_handshaking(&self) -> bool {
        self.handshake == HandshakeState::AwaitingAck
    }

    pub fn is_handshake_completed(&self) -> bool {
        self.handshake == HandshakeState::Completed
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// A new socket is about to be opened, or the old one was aborted
    pub fn begin_attempt(&mut self) {
        self.handshake = HandshakeState::Idle;
    }

    /// The socket reported it is connected
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Outcome of writing and flushing the handshake frame
    pub fn handshake_sent(&mut self, ok: bool) {
        self.handshake = if ok {
            HandshakeState::AwaitingAck
        } else {
            HandshakeState::Idle
        };
    }

    /// An inbound frame was processed; `ok` is false if processing failed
    ///
    /// Returns true when this frame completed the handshake. The pending
    /// handshake gate is consumed whatever the outcome.
    pub fn frame_received(&mut self, ok: bool) -> bool {
        match self.handshake {
            HandshakeState::AwaitingAck if ok => {
                self.handshake = HandshakeState::Completed;
                true
            }
            HandshakeState::AwaitingAck => {
                self.handshake = HandshakeState::Idle;
                false
            }
            HandshakeState::Idle | HandshakeState::Completed => false,
        }
    }

    /// The socket disconnected
    pub fn connection_lost(&mut self) {
        self.handshake = HandshakeState::Idle;
    }
}
