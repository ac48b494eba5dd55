//! Risk tiers assigned to trojan candidates.

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};

/// Severity of a trojan candidate.
///
/// Ordered from least to most severe so that `max()` picks the worst tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// At or above the medium boundary.
    Low,
    /// Below the medium boundary.
    Medium,
    /// Below the high boundary.
    High,
    /// Below the critical boundary.
    Critical,
}

impl RiskLevel {
    /// Upper-case label used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage-of-average boundaries separating the risk levels.
///
/// Each boundary is exclusive on the upper side: a signal at exactly
/// `critical` percent is [`RiskLevel::High`], not critical.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskTiers {
    /// Below this percentage a candidate is critical.
    pub critical: f64,
    /// Below this percentage a candidate is high risk.
    pub high: f64,
    /// Below this percentage a candidate is medium risk.
    pub medium: f64,
}

impl Default for RiskTiers {
    fn default() -> Self {
        Self {
            critical: 5.0,
            high: 10.0,
            medium: 20.0,
        }
    }
}

impl RiskTiers {
    /// Returns true if the boundaries are non-negative and strictly ascending.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.critical >= 0.0 && self.critical < self.high && self.high < self.medium
    }

    /// Classify a percentage of the corpus average.
    #[contracts::debug_requires(percentage_of_average >= 0.0)]
    #[must_use]
    pub fn classify(&self, percentage_of_average: f64) -> RiskLevel {
        if percentage_of_average < self.critical {
            RiskLevel::Critical
        } else if percentage_of_average < self.high {
            RiskLevel::High
        } else if percentage_of_average < self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, RiskLevel::Critical)]
    #[case(4.99, RiskLevel::Critical)]
    #[case(5.0, RiskLevel::High)]
    #[case(9.99, RiskLevel::High)]
    #[case(10.0, RiskLevel::Medium)]
    #[case(19.99, RiskLevel::Medium)]
    #[case(20.0, RiskLevel::Low)]
    #[case(75.0, RiskLevel::Low)]
    fn test_default_tier_boundaries(#[case] pct: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskTiers::default().classify(pct), expected);
    }

    #[test]
    fn test_levels_are_ordered_by_severity() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn test_non_ascending_tiers_rejected() {
        let tiers = RiskTiers {
            critical: 10.0,
            high: 5.0,
            medium: 20.0,
        };
        assert!(!tiers.is_ascending());
        assert!(RiskTiers::default().is_ascending());
    }

    #[test]
    fn test_level_serializes_upper_case() {
        let json = serde_json::to_string(&[RiskLevel::Critical, RiskLevel::Low]).unwrap();
        assert_eq!(json, r#"["CRITICAL","LOW"]"#);
        let back: RiskLevel = serde_json::from_str(r#""MEDIUM""#).unwrap();
        assert_eq!(back, RiskLevel::Medium);
    }
}
