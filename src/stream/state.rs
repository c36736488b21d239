/// Lifecycle of a notification stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket; a reconnect may be pending
    #[default]
    Closed,
    /// Socket opened, waiting for the open signal
    Connecting,
    Open,
    /// Terminal: no socket, no timers, no further transitions
    Disposed,
}

impl ConnectionState {
    /// Whether a new socket may be opened from this state
    pub fn can_connect(self) -> bool {
        self == ConnectionState::Closed
    }
}

/// Snapshot published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStatus {
    pub state: ConnectionState,
    /// Reconnects scheduled since the last successful open
    pub reconnect_attempts: u32,
}
