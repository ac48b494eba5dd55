//! Percentile-based low-activity scoring.
//!
//! The scorer finds signals whose activity is far below that of the rest of
//! the design, then keeps the register-like ones as trojan candidates. A
//! rarely toggling flip-flop is the classic footprint of a trigger counter
//! or a dormant payload enable.

use itertools::Itertools;
use pctd_common::{DetectorConfig, RiskLevel, RiskTiers};
use serde::Serialize;
use tracing::{debug, info};

use crate::MatchedRule;

/// Per-signal input to the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalActivity {
    /// Reported signal name.
    pub name: String,
    /// Counted transitions.
    pub transition_count: u64,
    /// Rule that classified the signal as register-like, if any.
    pub register_rule: Option<MatchedRule>,
}

impl SignalActivity {
    /// A signal not (yet) classified as a register.
    pub fn new(name: impl Into<String>, transition_count: u64) -> Self {
        Self {
            name: name.into(),
            transition_count,
            register_rule: None,
        }
    }

    /// Attach the classifier decision.
    #[must_use]
    pub fn with_rule(mut self, rule: Option<MatchedRule>) -> Self {
        self.register_rule = rule;
        self
    }

    /// Returns true if the classifier flagged this signal.
    #[must_use]
    pub const fn is_register(&self) -> bool {
        self.register_rule.is_some()
    }
}

/// The low-activity cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    /// Percentile it was taken at.
    pub percentile: f64,
    /// Index into the ascending positive counts.
    pub index: usize,
    /// Count at that index. Signals strictly below are suspicious.
    pub value: u64,
}

/// A signal whose activity is below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspiciousSignal {
    /// Reported signal name.
    pub name: String,
    /// Counted transitions.
    pub transition_count: u64,
    /// `1 - count / average`.
    pub suspicion_score: f64,
    /// `100 * count / average`.
    pub percentage_of_average: f64,
}

/// A register-like suspicious signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Reported signal name.
    pub signal_name: String,
    /// Counted transitions.
    pub transition_count: u64,
    /// `100 * count / average`.
    pub percentage_of_average: f64,
    /// `1 - count / average`.
    pub suspicion_score: f64,
    /// Suspicion score as a percentage.
    pub trojan_probability: f64,
    /// Tier derived from the percentage of average.
    pub risk_level: RiskLevel,
    /// Rule that made the signal register-like.
    pub matched_rule: MatchedRule,
}

/// Scorer output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Cut-off used; `None` when no signal toggled at all.
    pub threshold: Option<Threshold>,
    /// Corpus average transition count.
    pub average: f64,
    /// Number of signals given to the scorer.
    pub signals_analyzed: usize,
    /// Suspicious signals, ascending by count.
    pub suspicious: Vec<SuspiciousSignal>,
    /// Candidates, descending by trojan probability.
    pub candidates: Vec<Candidate>,
}

impl Detection {
    /// Candidates at the critical tier.
    pub fn critical(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.risk_level == RiskLevel::Critical)
    }

    /// Worst tier among the candidates.
    #[must_use]
    pub fn worst_risk(&self) -> Option<RiskLevel> {
        self.candidates.iter().map(|c| c.risk_level).max()
    }
}

/// Ranks low-activity register-like signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScorer {
    percentile: f64,
    tiers: RiskTiers,
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl AnomalyScorer {
    /// Scorer with an explicit percentile and tier policy.
    #[contracts::debug_requires((0.0..=100.0).contains(&percentile))]
    #[must_use]
    pub fn new(percentile: f64, tiers: RiskTiers) -> Self {
        Self { percentile, tiers }
    }

    /// Scorer configured from a validated config.
    #[must_use]
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.low_activity_percentile, config.risk_tiers)
    }

    /// The threshold over a set of counts. Zero counts are ignored.
    #[must_use]
    pub fn threshold<I>(&self, counts: I) -> Option<Threshold>
    where
        I: IntoIterator<Item = u64>,
    {
        let positive = counts.into_iter().filter(|c| *c > 0).sorted().collect_vec();
        if positive.is_empty() {
            return None;
        }
        let raw = (positive.len() as f64 * self.percentile / 100.0).floor() as usize;
        let index = raw.min(positive.len() - 1);
        Some(Threshold {
            percentile: self.percentile,
            index,
            value: positive[index],
        })
    }

    /// Score every signal against `average`.
    ///
    /// Degenerate input (no signals, nothing toggled) yields empty lists.
    #[must_use]
    pub fn score(&self, signals: &[SignalActivity], average: f64) -> Detection {
        let threshold = self.threshold(signals.iter().map(|s| s.transition_count));
        let mut detection = Detection {
            threshold,
            average,
            signals_analyzed: signals.len(),
            suspicious: Vec::new(),
            candidates: Vec::new(),
        };
        let Some(threshold) = threshold else {
            info!("No positive transition counts; nothing to score");
            return detection;
        };
        info!(
            "Threshold (bottom {}%): {} transitions",
            threshold.percentile, threshold.value
        );
        info!("Average transitions: {average:.2}");

        let mut flagged = signals
            .iter()
            .filter(|s| s.transition_count > 0 && s.transition_count < threshold.value)
            .collect_vec();
        flagged.sort_by_key(|s| s.transition_count);

        for signal in flagged {
            let (suspicion_score, percentage_of_average) = if average > 0.0 {
                let ratio = signal.transition_count as f64 / average;
                (1.0 - ratio, ratio * 100.0)
            } else {
                (0.0, 0.0)
            };
            detection.suspicious.push(SuspiciousSignal {
                name: signal.name.clone(),
                transition_count: signal.transition_count,
                suspicion_score,
                percentage_of_average,
            });

            let Some(rule) = &signal.register_rule else {
                debug!("{} is quiet but not register-like", signal.name);
                continue;
            };
            let risk_level = self.tiers.classify(percentage_of_average);
            debug!(
                "{} flagged by {rule}: {percentage_of_average:.2}% of average, {risk_level}",
                signal.name
            );
            detection.candidates.push(Candidate {
                signal_name: signal.name.clone(),
                transition_count: signal.transition_count,
                percentage_of_average,
                suspicion_score,
                trojan_probability: suspicion_score * 100.0,
                risk_level,
                matched_rule: rule.clone(),
            });
        }

        detection
            .candidates
            .sort_by(|a, b| b.trojan_probability.total_cmp(&a.trojan_probability));

        info!("Found {} suspicious signals", detection.suspicious.len());
        info!(
            "Identified {} potential Trojan candidates",
            detection.candidates.len()
        );
        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, count: u64) -> SignalActivity {
        SignalActivity::new(name, count).with_rule(Some(MatchedRule::Pattern("register_suffix")))
    }

    #[test]
    fn test_threshold_ignores_zero_counts() {
        let scorer = AnomalyScorer::default();
        let t = scorer.threshold([0, 0, 7, 3]).unwrap();
        assert_eq!(t.index, 0);
        assert_eq!(t.value, 3);
        assert!(scorer.threshold([0, 0]).is_none());
    }

    #[test]
    fn test_threshold_index_is_clamped() {
        let scorer = AnomalyScorer::new(100.0, RiskTiers::default());
        let t = scorer.threshold([4, 1, 9]).unwrap();
        assert_eq!(t.index, 2);
        assert_eq!(t.value, 9);
    }

    #[test]
    fn test_zero_average_guard() {
        let signals = [register("a_reg", 1), register("b_reg", 5)];
        let detection = AnomalyScorer::new(50.0, RiskTiers::default()).score(&signals, 0.0);
        assert_eq!(detection.suspicious.len(), 1);
        assert_eq!(detection.suspicious[0].suspicion_score, 0.0);
        assert_eq!(detection.candidates[0].percentage_of_average, 0.0);
    }

    #[test]
    fn test_non_registers_are_suspicious_only() {
        let signals = [
            SignalActivity::new("irq", 1),
            register("armed_reg", 2),
            SignalActivity::new("clk", 100),
            SignalActivity::new("tx", 50),
        ];
        let detection = AnomalyScorer::new(50.0, RiskTiers::default()).score(&signals, 38.25);
        let names = detection.suspicious.iter().map(|s| s.name.as_str()).collect_vec();
        assert_eq!(names, vec!["irq", "armed_reg"]);
        assert_eq!(detection.candidates.len(), 1);
        assert_eq!(detection.candidates[0].signal_name, "armed_reg");
        assert_eq!(detection.worst_risk(), Some(RiskLevel::High));
    }
}
