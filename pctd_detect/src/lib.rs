//! Activity-anomaly trojan detection.
//!
//! Signals that toggle far less than the rest of the design and look like
//! flip-flops are ranked as hardware trojan candidates. The pipeline is:
//! - [`RegisterClassifier`]: design hints and ordered name rules,
//! - [`AnomalyScorer`]: percentile threshold, suspicion scores, risk tiers,
//! - [`DetectionReport`]: the plain-text report.
//!
//! [`Detector`] wires the stages to a transition artifact on disk.

mod classifier;
mod detector;
mod error;
mod report;
mod scorer;

pub use classifier::{MatchedRule, PatternRule, RegisterClassifier, RuleSet};
pub use detector::Detector;
pub use error::DetectError;
pub use report::DetectionReport;
pub use scorer::{AnomalyScorer, Candidate, Detection, SignalActivity, SuspiciousSignal, Threshold};
