//! Trace decoding and activity statistics.
//!
//! This crate turns a Value Change Dump into per-signal transition counts
//! ([`TraceDecoder`] → [`Trace`]), derives frequencies and corpus aggregates
//! ([`ActivityProfile`]), and reads and writes the transition artifact that
//! the detector consumes ([`TransitionArtifact`], [`ActivityCounts`]).

pub mod artifact;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod report;
pub mod signal;
pub mod stats;
pub mod timescale;
mod trace;

pub use artifact::{ActivityCounts, TransitionArtifact};
pub use decoder::{CancelToken, Decoded, TraceDecoder};
pub use diagnostics::{Diagnostic, Diagnostics, LineOutcome, SkipReason};
pub use error::{ArtifactError, TraceError};
pub use report::StatisticsReport;
pub use signal::{Sample, Signal, SignalKind, TransitionRule, ValueHistory};
pub use stats::{ActivityProfile, ActivitySummary};
pub use timescale::TimeUnit;
pub use trace::Trace;
