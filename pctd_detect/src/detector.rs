//! Detection facade tying artifact loading, design hints and scoring together.

use std::path::Path;

use pctd_common::{DesignSummary, DetectorConfig, HintSet, scan_design_file};
use pctd_trace::ActivityCounts;
use tracing::info;

use crate::{AnomalyScorer, DetectError, Detection, RegisterClassifier, RuleSet, SignalActivity};

/// Loads activity, classifies registers and scores them in one place.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectorConfig,
    hints: HintSet,
    design: Option<DesignSummary>,
}

impl Detector {
    /// Create a detector. The configuration is validated here.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;
        Ok(Self {
            config,
            hints: HintSet::new(),
            design: None,
        })
    }

    /// Add register hints supplied by the caller.
    #[must_use]
    pub fn with_hints(mut self, hints: HintSet) -> Self {
        self.hints.extend(hints.iter().map(str::to_string));
        self
    }

    /// Scan a design source and add the names it assigns in clocked blocks.
    pub fn with_design<P: AsRef<Path>>(mut self, path: P) -> Result<Self, DetectError> {
        let summary = scan_design_file(path)?;
        info!("Found {} signal declarations", summary.declarations);
        info!("Found {} always blocks", summary.always_blocks);
        info!(
            "Identified {} potential DFF signals from code structure",
            summary.register_hints.len()
        );
        self.hints
            .extend(summary.register_hints.iter().map(str::to_string));
        self.design = Some(summary);
        Ok(self)
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// What the design scan found, if a design was given.
    #[must_use]
    pub const fn design(&self) -> Option<&DesignSummary> {
        self.design.as_ref()
    }

    /// Classifier over the configured rule list and the collected hints.
    #[must_use]
    pub fn classifier(&self) -> RegisterClassifier {
        RegisterClassifier::new(RuleSet::from(self.config.rule_set), self.hints.clone())
    }

    /// Classify every counted signal.
    #[must_use]
    pub fn activities(&self, counts: &ActivityCounts) -> Vec<SignalActivity> {
        let classifier = self.classifier();
        counts
            .iter()
            .map(|(name, count)| {
                SignalActivity::new(name, count).with_rule(classifier.classify(name))
            })
            .collect()
    }

    /// Score in-memory counts.
    #[must_use]
    pub fn detect(&self, counts: &ActivityCounts) -> Detection {
        let signals = self.activities(counts);
        AnomalyScorer::from_config(&self.config).score(&signals, counts.average())
    }

    /// Load a transition artifact and score it.
    pub fn detect_file<P: AsRef<Path>>(&self, path: P) -> Result<Detection, DetectError> {
        let counts = ActivityCounts::load(path)?;
        if let (Some(min), Some(max)) = (counts.min(), counts.max()) {
            info!(
                "Transition statistics: min {min}, max {max}, avg {:.2}",
                counts.average()
            );
        }
        Ok(self.detect(&counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchedRule;
    use pctd_common::ConfigError;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DetectorConfig {
            low_activity_percentile: -1.0,
            ..DetectorConfig::default()
        };
        let err = Detector::new(config).unwrap_err();
        assert!(matches!(
            err,
            DetectError::Config(ConfigError::Percentile(_))
        ));
    }

    #[test]
    fn test_caller_hints_reach_the_classifier() {
        let detector = Detector::new(DetectorConfig::default())
            .unwrap()
            .with_hints(["armed"].into_iter().collect());
        let counts: ActivityCounts = [("armed", 1), ("clk", 90), ("tx", 40)]
            .into_iter()
            .collect();
        let activities = detector.activities(&counts);
        assert_eq!(
            activities[0].register_rule,
            Some(MatchedRule::Hint("armed".to_string()))
        );
        assert!(!activities[1].is_register());
    }
}
