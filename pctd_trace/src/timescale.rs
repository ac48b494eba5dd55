//! Trace time units and their conversion to nanoseconds.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref UNIT_TOKEN_RE: Regex = Regex::new(r"^\d*\s*[a-zA-Zµ]+$").unwrap();
    static ref UNIT_SEARCH_RE: Regex = Regex::new(r"(\d+\s*[a-zA-Zµ]+)").unwrap();
}

/// Declared time unit of a trace, kept verbatim (e.g. `"1ns"`, `"10 ps"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeUnit(String);

impl Default for TimeUnit {
    fn default() -> Self {
        Self("1ns".to_string())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TimeUnit {
    /// Wrap a unit string as declared.
    pub fn new(unit: impl Into<String>) -> Self {
        Self(unit.into())
    }

    /// The unit string as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nanoseconds per tick.
    ///
    /// The unit is matched by case-insensitive substring in the order
    /// ns, us, ms, ps. The numeric magnitude is not applied, so `10ns` is
    /// still 1. Unrecognized units fall back to 1.
    #[must_use]
    pub fn ns_multiplier(&self) -> f64 {
        let unit = self.0.to_lowercase();
        if unit.contains("ns") {
            1.0
        } else if unit.contains("us") || unit.contains("µs") {
            1_000.0
        } else if unit.contains("ms") {
            1_000_000.0
        } else if unit.contains("ps") {
            0.001
        } else {
            1.0
        }
    }

    /// Extract the unit from a `$timescale` line.
    ///
    /// The second token is taken directly when it looks like a unit.
    /// Otherwise the first `<digits><letters>` run on the line is used, which
    /// also covers the `1 ns` spelling.
    pub(crate) fn from_declaration(line: &str) -> Option<Self> {
        if let Some(token) = line.split_whitespace().nth(1) {
            if !token.starts_with('$') && UNIT_TOKEN_RE.is_match(token) {
                return Some(Self::new(token));
            }
        }
        Self::search(line)
    }

    /// Find a `<digits><letters>` run anywhere on a line.
    pub(crate) fn search(line: &str) -> Option<Self> {
        UNIT_SEARCH_RE
            .captures(line)
            .map(|caps| Self::new(caps[1].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1ns", 1.0)]
    #[case("10NS", 1.0)]
    #[case("1us", 1_000.0)]
    #[case("1µs", 1_000.0)]
    #[case("100ms", 1_000_000.0)]
    #[case("1ps", 0.001)]
    #[case("1fs", 1.0)]
    #[case("1s", 1.0)]
    fn test_multiplier_table(#[case] unit: &str, #[case] expected: f64) {
        assert_eq!(TimeUnit::new(unit).ns_multiplier(), expected);
    }

    #[rstest]
    #[case("$timescale 1ns $end", Some("1ns"))]
    #[case("$timescale 1 ps $end", Some("1 ps"))]
    #[case("$timescale 10us", Some("10us"))]
    #[case("$timescale $end", None)]
    #[case("$timescale", None)]
    fn test_unit_from_declaration(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            TimeUnit::from_declaration(line),
            expected.map(TimeUnit::new)
        );
    }
}
