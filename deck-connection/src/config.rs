//! Configuration types for the deck-connection crate
//!
//! The host hands the plugin its port, registration token and registration
//! event name at launch; everything else has a default.

use std::time::Duration;

use crate::error::ConnectionError;

/// Configuration for a [`Connection`](crate::Connection)
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Host the WebSocket server listens on
    /// Default: "127.0.0.1"
    pub host: String,

    /// Port the WebSocket server listens on
    pub port: u16,

    /// Token sent in the registration handshake
    pub token: String,

    /// Event name of the registration handshake
    pub registration_event: String,

    /// Delay before the first reconnect attempt after a close or error
    /// Default: 250 milliseconds
    pub reconnect_delay: Duration,

    /// Upper bound for the doubling reconnect delay
    /// Default: 10 seconds
    pub max_reconnect_delay: Duration,
}

impl ConnectionConfig {
    /// Create a configuration from the parameters the host provides.
    pub fn new(port: u16, token: impl Into<String>, registration_event: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            token: token.into(),
            registration_event: registration_event.into(),
            reconnect_delay: Duration::from_millis(250),
            max_reconnect_delay: Duration::from_secs(10),
        }
    }

    /// Reconnect without waiting between attempts.
    pub fn immediate_reconnect(mut self) -> Self {
        self.reconnect_delay = Duration::ZERO;
        self.max_reconnect_delay = Duration::ZERO;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_reconnect_delay(mut self, initial: Duration, max: Duration) -> Self {
        self.reconnect_delay = initial;
        self.max_reconnect_delay = max;
        self
    }

    /// WebSocket URL of the host.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.host.is_empty() {
            return Err(ConnectionError::Configuration(
                "Host must not be empty".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConnectionError::Configuration(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.token.is_empty() {
            return Err(ConnectionError::Configuration(
                "Registration token must not be empty".to_string(),
            ));
        }

        if self.registration_event.is_empty() {
            return Err(ConnectionError::Configuration(
                "Registration event must not be empty".to_string(),
            ));
        }

        if self.reconnect_delay > self.max_reconnect_delay {
            return Err(ConnectionError::Configuration(
                "Invalid reconnect delay: initial must not exceed max".to_string(),
            ));
        }

        Ok(())
    }
}
