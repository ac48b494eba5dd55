//! Configuration for trace decoding and anomaly detection.
//!
//! The two main concepts are:
//! - decode options: how much per-signal state the decoder retains while it
//!   streams a trace (value history, diagnostics, naming).
//! - detector options: which percentile marks the low-activity threshold,
//!   where the risk tier boundaries sit, and which name rules classify a
//!   signal as register-like.
//!
//! Quick example
//!
//! ```ignore
//! use pctd_common::{DetectorConfig, RuleSetKind};
//! let cfg = DetectorConfig::builder()
//!     .low_activity_percentile(5.0)
//!     .rule_set(RuleSetKind::Extended)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RiskTiers;

/// Errors raised when a configuration fails validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The percentile is outside `0..=100` or not a number.
    #[error("Low-activity percentile must be within 0..=100, got {0}")]
    Percentile(f64),
    /// Risk boundaries are negative or not strictly ascending.
    #[error("Risk tiers must be ascending (critical < high < medium), got {0:?}")]
    RiskTiers(RiskTiers),
    /// History retention was requested with a zero depth.
    #[error("History depth must be at least 1 when value history is retained")]
    HistoryDepth,
}

/// Options controlling what the trace decoder keeps in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Keep a per-signal ring of recent `(time, value)` samples.
    pub retain_value_history: bool,
    /// Ring capacity per signal when history is retained.
    pub history_depth: usize,
    /// Maximum number of skipped-line records kept in the diagnostics.
    pub max_diagnostics: usize,
    /// Key transition counts by `scope.name` instead of the bare name.
    pub hierarchical_names: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            retain_value_history: false,
            history_depth: 64,
            max_diagnostics: 1000,
            hierarchical_names: false,
        }
    }
}

/// Which ordered list of name rules the register classifier uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleSetKind {
    /// The five rules used when ranking trojan candidates.
    #[default]
    Detection,
    /// The wider list used when exporting register-only activity.
    Extended,
}

/// Full configuration of the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Percentile of positive transition counts that sets the threshold.
    pub low_activity_percentile: f64,
    /// Percentage-of-average boundaries for the risk levels.
    pub risk_tiers: RiskTiers,
    /// Decoder retention options.
    pub decode: DecodeOptions,
    /// Rule list used to classify register-like signals.
    pub rule_set: RuleSetKind,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            low_activity_percentile: 10.0,
            risk_tiers: RiskTiers::default(),
            decode: DecodeOptions::default(),
            rule_set: RuleSetKind::Detection,
        }
    }
}

impl DetectorConfig {
    /// Start a builder populated with the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.low_activity_percentile;
        if !(0.0..=100.0).contains(&p) {
            return Err(ConfigError::Percentile(p));
        }
        if !self.risk_tiers.is_ascending() {
            return Err(ConfigError::RiskTiers(self.risk_tiers));
        }
        if self.decode.retain_value_history && self.decode.history_depth == 0 {
            return Err(ConfigError::HistoryDepth);
        }
        Ok(())
    }
}

/// Builder for [`DetectorConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: DetectorConfig,
}

impl ConfigBuilder {
    /// Set the low-activity percentile (0..=100).
    #[must_use]
    pub fn low_activity_percentile(mut self, percentile: f64) -> Self {
        self.config.low_activity_percentile = percentile;
        self
    }

    /// Override the risk tier boundaries.
    #[must_use]
    pub fn risk_tiers(mut self, tiers: RiskTiers) -> Self {
        self.config.risk_tiers = tiers;
        self
    }

    /// Retain up to `depth` recent samples per signal.
    #[must_use]
    pub fn retain_value_history(mut self, depth: usize) -> Self {
        self.config.decode.retain_value_history = true;
        self.config.decode.history_depth = depth;
        self
    }

    /// Cap the number of retained diagnostics records.
    #[must_use]
    pub fn max_diagnostics(mut self, max: usize) -> Self {
        self.config.decode.max_diagnostics = max;
        self
    }

    /// Key signals by their scope-qualified name.
    #[must_use]
    pub fn hierarchical_names(mut self, enabled: bool) -> Self {
        self.config.decode.hierarchical_names = enabled;
        self
    }

    /// Replace all decode options at once.
    #[must_use]
    pub fn decode_options(mut self, options: DecodeOptions) -> Self {
        self.config.decode = options;
        self
    }

    /// Choose the classifier rule list.
    #[must_use]
    pub fn rule_set(mut self, kind: RuleSetKind) -> Self {
        self.config.rule_set = kind;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<DetectorConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
