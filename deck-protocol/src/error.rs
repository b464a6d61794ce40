//! Error types for the deck-protocol crate.

use std::path::PathBuf;

/// Errors produced while encoding frames or loading the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A message could not be serialized to JSON
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// The manifest file could not be read
    #[error("Failed to read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest document is not valid
    #[error("Invalid manifest: {0}")]
    ManifestParse(#[source] serde_json::Error),
}

/// An inbound frame that is not a valid JSON document, or whose fields have
/// the wrong shape.
///
/// The raw frame is kept so it can be logged alongside the cause.
#[derive(Debug, thiserror::Error)]
#[error("Failed to decode frame ({source}): {raw}")]
pub struct DecodeError {
    /// The frame text exactly as received
    pub raw: String,
    /// The underlying parser error
    #[source]
    pub source: serde_json::Error,
}

/// Convenience type alias for Results using ProtocolError.
pub type Result<T> = std::result::Result<T, ProtocolError>;
