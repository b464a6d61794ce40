use std::time::Duration;

/// Errors returned while waiting for a correlated reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    /// No matching reply arrived within the allotted time
    #[error("No reply received within {0:?}")]
    Timeout(Duration),

    /// The listener was removed before a reply arrived
    #[error("Reply listener was removed before a reply arrived")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_error_display() {
        assert_eq!(
            CorrelationError::Timeout(Duration::from_millis(250)).to_string(),
            "No reply received within 250ms"
        );
        assert_eq!(
            CorrelationError::Abandoned.to_string(),
            "Reply listener was removed before a reply arrived"
        );
    }
}
