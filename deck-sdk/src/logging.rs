//! Logging setup for plugin processes.
//!
//! The host captures a plugin's stderr into its own log, so the default mode
//! writes nothing and plugins opt in to output.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How much the plugin logs, and in what format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    /// No subscriber is installed
    #[default]
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Pretty stderr output at `debug`, with thread ids and source locations
    Debug,
}

impl LoggingMode {
    /// Parse a `DECK_LOG_MODE` value. Unknown values yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" => Some(Self::Silent),
            "development" | "dev" => Some(Self::Development),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },
}

/// Install a global subscriber for `mode`.
///
/// Call once, early, before the plugin connects. A second call fails with
/// [`LoggingError::TracingInit`].
///
/// # Environment Variables
///
/// - `DECK_LOG_LEVEL`: filter directives (e.g. `deck_connection=debug`)
/// - `RUST_LOG`: used when `DECK_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;
            Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;
            Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize from `DECK_LOG_MODE` (`silent`, `development`, `debug`).
/// Missing or unknown values mean silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("DECK_LOG_MODE")
        .ok()
        .and_then(|value| LoggingMode::from_name(&value))
        .unwrap_or_default();
    init_logging(mode)
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("DECK_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives,
        message: e.to_string(),
    })
}

/// Whether a global subscriber has been installed.
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[rstest]
    #[case("silent", Some(LoggingMode::Silent))]
    #[case("Development", Some(LoggingMode::Development))]
    #[case(" debug ", Some(LoggingMode::Debug))]
    #[case("verbose", None)]
    fn test_mode_from_name(#[case] name: &str, #[case] expected: Option<LoggingMode>) {
        assert_eq!(LoggingMode::from_name(name), expected);
    }

    #[test]
    fn test_default_mode_is_silent() {
        assert_eq!(LoggingMode::default(), LoggingMode::Silent);
    }
}
