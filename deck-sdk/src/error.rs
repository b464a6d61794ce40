use deck_connection::ConnectionError;
use deck_events::CorrelationError;
use deck_protocol::ProtocolError;
use thiserror::Error;

use crate::logging::LoggingError;
use crate::params::ParamsError;

/// Errors returned by the plugin facade and the convenience handles.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("No reply: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Invalid registration parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Reply payload did not match the expected shape: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors from registering an action handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Action handler has no manifest id")]
    MissingManifestId,
}

/// Error type returned by [`ActionHandler`](crate::ActionHandler) callbacks.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of an [`ActionHandler`](crate::ActionHandler) callback.
pub type HandlerResult = std::result::Result<(), HandlerError>;

pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let error = SdkError::from(RouterError::MissingManifestId);
        assert_eq!(error.to_string(), "Router error: Action handler has no manifest id");

        let error = SdkError::from(CorrelationError::Timeout(Duration::from_secs(2)));
        assert!(error.to_string().starts_with("No reply:"));

        let error = SdkError::from(ConnectionError::Closed);
        assert!(error.to_string().starts_with("Connection error:"));
    }
}
