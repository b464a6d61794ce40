//! Error types for the deck-connection crate.

use std::time::Duration;

use deck_protocol::ProtocolError;

/// Errors surfaced to callers of [`Connection`](crate::Connection).
///
/// Socket failures are never returned directly; they are logged and the
/// connection reconnects.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `connect()` was called outside a tokio runtime
    #[error("No tokio runtime available to drive the connection")]
    NoRuntime,

    /// A command could not be encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection was closed before the command could be written
    #[error("Connection is closed")]
    Closed,

    /// The socket failed while writing the command; it will not be retried
    #[error("Frame was dropped: {0}")]
    FrameDropped(String),

    /// The connection did not become ready in time
    #[error("Connection not ready after {0:?}")]
    Timeout(Duration),

    /// A context-correlated request was issued without a context
    #[error("Command {0} has no context to correlate a reply with")]
    MissingContext(String),
}

/// Convenience type alias for Results using ConnectionError.
pub type Result<T> = std::result::Result<T, ConnectionError>;
