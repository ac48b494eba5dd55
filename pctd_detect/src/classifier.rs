//! Register-likeness classification of signal names.
//!
//! A signal is treated as state-holding when either a design hint names it
//! or one of an ordered list of name rules matches. [`RegisterClassifier::classify`]
//! is the single entry point and reports the first rule that fired.

use std::fmt;

use lazy_static::lazy_static;
use pctd_common::{HintSet, RuleSetKind};
use regex::Regex;
use serde::Serialize;

/// A named, case-insensitive regular expression over a full signal name.
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: &'static str,
    regex: Regex,
}

impl PatternRule {
    fn new(id: &'static str, pattern: &str) -> Self {
        Self {
            id,
            regex: Regex::new(&format!("(?i){pattern}")).unwrap(),
        }
    }

    /// Stable identifier shown in reports.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// The pattern as compiled, including the case-insensitivity flag.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the rule matches `name`.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

lazy_static! {
    static ref DETECTION_RULES: Vec<PatternRule> = vec![
        PatternRule::new("register_suffix", r"^.*_reg\[?\d*\]?$"),
        PatternRule::new("output_suffix", r"^.*_q\[?\d*\]?$"),
        PatternRule::new("state", r"^.*state.*"),
        PatternRule::new("counter", r"^.*count.*"),
        PatternRule::new("shift", r"^.*shift.*"),
    ];
    static ref EXTENDED_RULES: Vec<PatternRule> = vec![
        PatternRule::new("q_suffix", r"^.*_Q$"),
        PatternRule::new("q_suffix_lower", r"^.*_q$"),
        PatternRule::new("reg_indexed", r"^.*_reg\[.*\]$"),
        PatternRule::new("reg_suffix", r"^.*_reg$"),
        PatternRule::new("dff", r"^.*dff.*"),
        PatternRule::new("state", r"^.*state.*"),
        PatternRule::new("cntr", r"^.*[Cc]ntr.*"),
        PatternRule::new("count", r"^.*[Cc]ount.*"),
        PatternRule::new("shift", r"^.*[Ss]hift.*"),
        PatternRule::new("ff_suffix", r"^.*_ff.*"),
        PatternRule::new("q_bus", r"^q\[.*\]$"),
    ];
}

/// An ordered list of pattern rules. The first matching rule wins.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    kind: RuleSetKind,
    rules: &'static [PatternRule],
}

impl RuleSet {
    /// The five rules used when ranking trojan candidates.
    #[must_use]
    pub fn detection() -> Self {
        Self {
            kind: RuleSetKind::Detection,
            rules: DETECTION_RULES.as_slice(),
        }
    }

    /// The wider list used for register-only activity exports.
    #[must_use]
    pub fn extended() -> Self {
        Self {
            kind: RuleSetKind::Extended,
            rules: EXTENDED_RULES.as_slice(),
        }
    }

    /// Which list this is.
    #[must_use]
    pub const fn kind(&self) -> RuleSetKind {
        self.kind
    }

    /// Rules in evaluation order.
    #[must_use]
    pub const fn rules(&self) -> &'static [PatternRule] {
        self.rules
    }

    /// First rule matching `name`.
    #[must_use]
    pub fn first_match(&self, name: &str) -> Option<&'static PatternRule> {
        self.rules.iter().find(|rule| rule.is_match(name))
    }
}

impl From<RuleSetKind> for RuleSet {
    fn from(kind: RuleSetKind) -> Self {
        match kind {
            RuleSetKind::Detection => Self::detection(),
            RuleSetKind::Extended => Self::extended(),
        }
    }
}

/// Why a signal was classified as register-like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchedRule {
    /// A design hint contains the name or is contained in it.
    Hint(String),
    /// A pattern rule, by id.
    Pattern(&'static str),
}

impl fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hint(hint) => write!(f, "hint:{hint}"),
            Self::Pattern(id) => f.write_str(id),
        }
    }
}

/// Decides whether a signal name plausibly belongs to a flip-flop.
#[derive(Debug, Clone)]
pub struct RegisterClassifier {
    rules: RuleSet,
    hints: HintSet,
}

impl RegisterClassifier {
    /// Classifier over a rule list and a (possibly empty) hint set.
    #[must_use]
    pub const fn new(rules: RuleSet, hints: HintSet) -> Self {
        Self { rules, hints }
    }

    /// The rule list.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The hint set.
    #[must_use]
    pub const fn hints(&self) -> &HintSet {
        &self.hints
    }

    /// First satisfied rule for `name`: hints are checked before patterns.
    #[must_use]
    pub fn classify(&self, name: &str) -> Option<MatchedRule> {
        if let Some(hint) = self.hints.matching(name) {
            return Some(MatchedRule::Hint(hint.to_string()));
        }
        self.rules
            .first_match(name)
            .map(|rule| MatchedRule::Pattern(rule.id()))
    }

    /// Returns true if any rule classifies `name` as a register.
    #[must_use]
    pub fn is_register(&self, name: &str) -> bool {
        self.classify(name).is_some()
    }
}

impl Default for RegisterClassifier {
    fn default() -> Self {
        Self::new(RuleSet::detection(), HintSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trigger_reg", Some("register_suffix"))]
    #[case("data_reg[7]", Some("register_suffix"))]
    #[case("DATA_REG", Some("register_suffix"))]
    #[case("data_q", Some("output_suffix"))]
    #[case("data_q[3]", Some("output_suffix"))]
    #[case("fsm_state", Some("state"))]
    #[case("StateMachine", Some("state"))]
    #[case("bit_counter", Some("counter"))]
    #[case("shift_in", Some("shift"))]
    #[case("clk", None)]
    #[case("reg_enable", None)]
    #[case("data_reg_n", None)]
    fn test_detection_rules(#[case] name: &str, #[case] expected: Option<&str>) {
        let rules = RuleSet::detection();
        assert_eq!(rules.first_match(name).map(PatternRule::id), expected);
    }

    #[rstest]
    #[case("bus_Q", Some("q_suffix"))]
    #[case("bus_q", Some("q_suffix"))]
    #[case("mem_reg[3:0]", Some("reg_indexed"))]
    #[case("u_dff_0", Some("dff"))]
    #[case("bitCntr", Some("cntr"))]
    #[case("pipe_ff1", Some("ff_suffix"))]
    #[case("q[2]", Some("q_bus"))]
    #[case("tx", None)]
    fn test_extended_rules(#[case] name: &str, #[case] expected: Option<&str>) {
        // Case-insensitive, so `_Q$` also takes `bus_q` before `_q$` is tried.
        let rules = RuleSet::extended();
        assert_eq!(rules.first_match(name).map(PatternRule::id), expected);
    }

    #[test]
    fn test_hint_checked_before_patterns() {
        let hints = ["trigger_reg"].into_iter().collect::<HintSet>();
        let classifier = RegisterClassifier::new(RuleSet::detection(), hints);
        assert_eq!(
            classifier.classify("trigger_reg"),
            Some(MatchedRule::Hint("trigger_reg".to_string()))
        );
        assert_eq!(
            classifier.classify("fsm_state"),
            Some(MatchedRule::Pattern("state"))
        );
        assert_eq!(classifier.classify("clk"), None);
    }

    #[test]
    fn test_rule_set_from_kind() {
        assert_eq!(RuleSet::from(RuleSetKind::Extended).rules().len(), 11);
        assert_eq!(RuleSet::from(RuleSetKind::Detection).rules().len(), 5);
        assert_eq!(RuleSet::detection().rules()[0].pattern(), r"(?i)^.*_reg\[?\d*\]?$");
    }

    #[test]
    fn test_matched_rule_display() {
        assert_eq!(MatchedRule::Hint("cnt".into()).to_string(), "hint:cnt");
        assert_eq!(MatchedRule::Pattern("shift").to_string(), "shift");
    }
}
