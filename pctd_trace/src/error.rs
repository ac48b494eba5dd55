//! Error types for trace decoding and artifact handling.
//!
//! Content problems inside a trace are never errors; they are recorded as
//! diagnostics. Only failures to read the input at all surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a decode pass.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be opened.
    #[error("Failed to open trace {path}: {source}")]
    Open {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Reading failed part way through the stream.
    #[error("Failed to read trace at line {line}: {source}")]
    Read {
        /// Last line number reached.
        line: usize,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading or writing a transition artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact file could not be read or written.
    #[error("Artifact I/O failed for {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not JSON.
    #[error("Invalid JSON format: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is JSON but not a transition artifact.
    #[error("Malformed transition artifact: {0}")]
    Malformed(String),
}

impl ArtifactError {
    /// Create a malformed-artifact error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
