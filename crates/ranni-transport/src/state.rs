//! Connection lifecycle states.

use std::fmt;

/// Lifecycle of the gateway stream.
///
/// `Disconnected → Connecting → Connected → Draining → Disconnected`. A read
/// error or peer close skips `Draining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// A close frame was sent and the peer's acknowledgment is awaited.
    Draining,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Draining => "draining",
        };
        f.write_str(s)
    }
}
