//! Error types for the detection pipeline.

use pctd_common::{ConfigError, DesignError};
use pctd_trace::ArtifactError;
use thiserror::Error;

/// Errors that stop a detection run.
///
/// Malformed trace lines and degenerate data never surface here; they end
/// up in diagnostics or in an empty [`Detection`](crate::Detection).
#[derive(Debug, Error)]
pub enum DetectError {
    /// The detector configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The transition artifact could not be loaded.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The design source could not be read.
    #[error(transparent)]
    Design(#[from] DesignError),
}
