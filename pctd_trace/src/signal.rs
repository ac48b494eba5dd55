//! Traced signals and the rules that decide what counts as a transition.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of the value changes a signal receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// One-bit value, `<symbol><code>`.
    Scalar,
    /// Bus value, `b<bits> <code>`.
    Vector,
    /// Real value, `r<number> <code>`.
    Real,
}

impl SignalKind {
    /// Kind implied by a `$var` declaration before any value is seen.
    #[must_use]
    pub fn from_declaration(var_type: &str, bit_width: usize) -> Self {
        if var_type.eq_ignore_ascii_case("real") {
            Self::Real
        } else if bit_width == 1 {
            Self::Scalar
        } else {
            Self::Vector
        }
    }

    /// Counting rule applied to value changes of this shape.
    ///
    /// Scalars and buses deliberately disagree on indeterminate values:
    /// a scalar moving through `x`/`z` never counts, while any differing
    /// bus string counts even if it contains `x` bits.
    #[must_use]
    pub const fn transition_rule(&self) -> TransitionRule {
        match self {
            Self::Scalar => TransitionRule::KnownLevels,
            Self::Vector | Self::Real => TransitionRule::AnyChange,
        }
    }
}

/// Decides whether a value change is a counted transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionRule {
    /// Count only `0 -> 1` and `1 -> 0`.
    KnownLevels,
    /// Count any change of the value string.
    AnyChange,
}

impl TransitionRule {
    /// The first observation of a signal (`prev == None`) never counts.
    #[must_use]
    pub fn counts(&self, prev: Option<&str>, next: &str) -> bool {
        let Some(prev) = prev else {
            return false;
        };
        if prev == next {
            return false;
        }
        match self {
            Self::KnownLevels => is_known_level(prev) && is_known_level(next),
            Self::AnyChange => true,
        }
    }
}

fn is_known_level(value: &str) -> bool {
    value == "0" || value == "1"
}

/// One retained `(time, value)` observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Simulation time of the change, in trace ticks.
    pub time: u64,
    /// Observed value.
    pub value: String,
}

/// Fixed-capacity ring of the most recent samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHistory {
    samples: VecDeque<Sample>,
    depth: usize,
}

impl ValueHistory {
    /// Create an empty ring holding at most `depth` samples.
    #[contracts::debug_requires(depth > 0)]
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(depth),
            depth,
        }
    }

    fn push(&mut self, sample: Sample) {
        if self.depth == 0 {
            return;
        }
        while self.samples.len() >= self.depth {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if nothing has been retained yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

/// One traced circuit node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    code: String,
    name: String,
    scope: String,
    var_type: String,
    bit_width: usize,
    kind: SignalKind,
    last_value: Option<String>,
    transition_count: u64,
    history: Option<ValueHistory>,
}

impl Signal {
    /// Create a signal from its declaration fields.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        var_type: impl Into<String>,
        bit_width: usize,
    ) -> Self {
        let var_type = var_type.into();
        Self {
            code: code.into(),
            name: name.into(),
            scope: String::new(),
            kind: SignalKind::from_declaration(&var_type, bit_width),
            var_type,
            bit_width,
            last_value: None,
            transition_count: 0,
            history: None,
        }
    }

    /// Set the dotted path of the enclosing scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Start retaining up to `depth` samples.
    #[must_use]
    pub fn with_history(mut self, depth: usize) -> Self {
        self.history = Some(ValueHistory::new(depth));
        self
    }

    /// Apply a value change and return whether it counted as a transition.
    pub fn observe(&mut self, time: u64, kind: SignalKind, value: &str) -> bool {
        self.kind = kind;
        let counted = kind
            .transition_rule()
            .counts(self.last_value.as_deref(), value);
        if counted {
            self.transition_count += 1;
        }
        if let Some(history) = self.history.as_mut() {
            history.push(Sample {
                time,
                value: value.to_string(),
            });
        }
        self.last_value = Some(value.to_string());
        counted
    }

    /// Identifier local to the trace file.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted scope path, empty at top level.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// `scope.name`, or just the name at top level.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.scope.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.scope, self.name)
        }
    }

    /// Declared variable type (`wire`, `reg`, ...).
    #[must_use]
    pub fn var_type(&self) -> &str {
        &self.var_type
    }

    /// Declared width in bits.
    #[must_use]
    pub const fn bit_width(&self) -> usize {
        self.bit_width
    }

    /// Shape of the last applied value change.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Most recent value, if any was observed.
    #[must_use]
    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    /// Number of counted transitions.
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Retained samples, when history is enabled.
    #[must_use]
    pub const fn history(&self) -> Option<&ValueHistory> {
        self.history.as_ref()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} [{}]): {} transitions",
            self.qualified_name(),
            self.var_type,
            self.code,
            self.bit_width,
            self.transition_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "1", false)]
    #[case(Some("0"), "1", true)]
    #[case(Some("1"), "0", true)]
    #[case(Some("1"), "1", false)]
    #[case(Some("0"), "x", false)]
    #[case(Some("x"), "1", false)]
    #[case(Some("z"), "0", false)]
    fn test_known_levels_rule(
        #[case] prev: Option<&str>,
        #[case] next: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(TransitionRule::KnownLevels.counts(prev, next), expected);
    }

    #[rstest]
    #[case(None, "0101", false)]
    #[case(Some("00"), "01", true)]
    #[case(Some("00"), "0x", true)]
    #[case(Some("0x"), "0x", false)]
    fn test_any_change_rule(
        #[case] prev: Option<&str>,
        #[case] next: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(TransitionRule::AnyChange.counts(prev, next), expected);
    }

    #[test]
    fn test_kind_from_declaration() {
        assert_eq!(SignalKind::from_declaration("wire", 1), SignalKind::Scalar);
        assert_eq!(SignalKind::from_declaration("reg", 8), SignalKind::Vector);
        assert_eq!(SignalKind::from_declaration("real", 64), SignalKind::Real);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut signal = Signal::new("!", "clk", "wire", 1).with_history(2);
        for (t, v) in [(0, "0"), (5, "1"), (10, "0")] {
            signal.observe(t, SignalKind::Scalar, v);
        }
        let history = signal.history().unwrap();
        assert_eq!(history.len(), 2);
        let times = history.iter().map(|s| s.time).collect::<Vec<_>>();
        assert_eq!(times, vec![5, 10]);
        assert_eq!(signal.transition_count(), 2);
    }

    #[test]
    fn test_qualified_name() {
        let signal = Signal::new("#", "state_reg", "reg", 3).with_scope("tb.dut");
        assert_eq!(signal.qualified_name(), "tb.dut.state_reg");
        assert_eq!(Signal::new("$", "clk", "wire", 1).qualified_name(), "clk");
    }
}
