//! Per-line parse outcomes collected while decoding a trace.
//!
//! Decoding never stops on a bad line. Each skipped line is reported as a
//! [`Diagnostic`]; only the first `max_records` are kept, but the per-reason
//! totals are always exact.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest line excerpt stored in a diagnostic, in characters.
const EXCERPT_CHARS: usize = 80;

/// Why a line was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipReason {
    /// `$timescale` without a recognizable unit.
    MalformedTimescale,
    /// `$var` with fewer than five tokens.
    MalformedDeclaration,
    /// `$var` whose width token is not a number.
    InvalidWidth,
    /// `$scope` without a name.
    MalformedScope,
    /// `#` not followed by a non-negative integer.
    MalformedTimestamp,
    /// Value change with no signal code.
    MissingCode,
    /// Line in the value-change section that matches no known shape.
    UnrecognizedValueChange,
    /// Value change for a code that was never declared.
    UnknownCode,
}

impl SkipReason {
    /// Whether a line with this reason is kept as a record.
    ///
    /// Unknown codes are routine in traces that dump more than was declared
    /// in the scopes of interest, so they only feed the totals.
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        !matches!(self, Self::UnknownCode)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MalformedTimescale => "malformed timescale",
            Self::MalformedDeclaration => "malformed variable declaration",
            Self::InvalidWidth => "invalid variable width",
            Self::MalformedScope => "malformed scope",
            Self::MalformedTimestamp => "malformed timestamp",
            Self::MissingCode => "value change without signal code",
            Self::UnrecognizedValueChange => "unrecognized value change",
            Self::UnknownCode => "undeclared signal code",
        };
        f.write_str(text)
    }
}

/// Outcome of decoding one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line changed decoder state.
    Applied,
    /// The line carries nothing the decoder needs.
    Ignored,
    /// The line could not be used.
    Skipped(SkipReason),
}

/// A skipped line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number in the trace.
    pub line: usize,
    /// Why the line was skipped.
    pub reason: SkipReason,
    /// Start of the offending line.
    pub excerpt: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.reason, self.excerpt)
    }
}

/// Bounded list of skipped lines with exact totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    totals: BTreeMap<SkipReason, usize>,
    max_records: usize,
}

impl Diagnostics {
    /// Create an empty collection keeping at most `max_records` records.
    #[must_use]
    pub const fn new(max_records: usize) -> Self {
        Self {
            records: Vec::new(),
            totals: BTreeMap::new(),
            max_records,
        }
    }

    /// Register a skipped line. Returns the record if it was retained.
    pub fn push(&mut self, line: usize, reason: SkipReason, text: &str) -> Option<&Diagnostic> {
        *self.totals.entry(reason).or_default() += 1;
        if !reason.is_recorded() || self.records.len() >= self.max_records {
            return None;
        }
        self.records.push(Diagnostic {
            line,
            reason,
            excerpt: text.chars().take(EXCERPT_CHARS).collect(),
        });
        self.records.last()
    }

    /// Retained records in line order.
    #[must_use]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Exact number of skipped lines for a reason.
    #[must_use]
    pub fn total(&self, reason: SkipReason) -> usize {
        self.totals.get(&reason).copied().unwrap_or(0)
    }

    /// Exact number of skipped lines across all reasons.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.totals.values().sum()
    }

    /// Per-reason totals.
    pub fn totals(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        self.totals.iter().map(|(r, n)| (*r, *n))
    }

    /// Returns true if no line was skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_bounded_but_totals_exact() {
        let mut diags = Diagnostics::new(2);
        for line in 1..=5 {
            diags.push(line, SkipReason::MalformedTimestamp, "#abc");
        }
        assert_eq!(diags.records().len(), 2);
        assert_eq!(diags.total(SkipReason::MalformedTimestamp), 5);
        assert_eq!(diags.total_skipped(), 5);
    }

    #[test]
    fn test_unknown_codes_only_counted() {
        let mut diags = Diagnostics::new(10);
        assert!(diags.push(3, SkipReason::UnknownCode, "1?").is_none());
        assert!(diags.records().is_empty());
        assert_eq!(diags.total(SkipReason::UnknownCode), 1);
    }

    #[test]
    fn test_excerpt_truncated_on_char_boundary() {
        let mut diags = Diagnostics::new(1);
        let long = "µ".repeat(200);
        let record = diags
            .push(1, SkipReason::UnrecognizedValueChange, &long)
            .unwrap();
        assert_eq!(record.excerpt.chars().count(), EXCERPT_CHARS);
    }
}
