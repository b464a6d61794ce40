use std::fmt;

/// Lifecycle of a [`Connection`](crate::Connection).
///
/// `Disconnected` only before the first `connect()` and after `close()`;
/// a live connection moves between `Connecting` and `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Opening a socket or waiting to retry
    Connecting,
    /// Socket open and handshake sent; outbound frames are flowing
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}
