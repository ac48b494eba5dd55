//! Plain-text detection report and console summary.

use std::fmt::{self, Write as _};
use std::path::Path;

use crate::Detection;

/// Candidates listed in the console summary.
const TOP_SUSPECTS: usize = 5;

const RULE: &str = "--------------------------------------------------------------------------------";
const DOUBLE_RULE: &str =
    "================================================================================";
const ALARM_RULE: &str =
    "!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!";

/// Report over one detection run.
#[derive(Debug, Clone, Copy)]
pub struct DetectionReport<'a> {
    /// Design source the hints were taken from, if any.
    pub design: Option<&'a Path>,
    /// Transition data that was scored.
    pub transitions: &'a Path,
    /// Scorer output.
    pub detection: &'a Detection,
    /// Percentile the threshold was requested at.
    pub percentile: f64,
}

impl DetectionReport<'_> {
    /// Render the full report text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Short multi-line summary of the top suspects.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_summary(&mut out);
        out
    }

    fn write_summary(&self, f: &mut String) -> fmt::Result {
        let candidates = &self.detection.candidates;
        writeln!(f, "{DOUBLE_RULE}")?;
        writeln!(f, "DETECTION SUMMARY")?;
        writeln!(f, "{DOUBLE_RULE}")?;
        writeln!(f, "Trojan Candidates Found: {}", candidates.len())?;
        if candidates.is_empty() {
            writeln!(f, "\nNo Trojan candidates detected.")?;
            writeln!(f, "All signals show normal activity patterns.")?;
        } else {
            writeln!(f, "\nTop {TOP_SUSPECTS} Suspects:")?;
            for (i, c) in candidates.iter().take(TOP_SUSPECTS).enumerate() {
                writeln!(f, "  {}. {}", i + 1, c.signal_name)?;
                writeln!(f, "     - Transitions: {}", c.transition_count)?;
                writeln!(
                    f,
                    "     - Activity: {:.2}% of average",
                    c.percentage_of_average
                )?;
                writeln!(
                    f,
                    "     - Trojan Probability: {:.1}%",
                    c.trojan_probability
                )?;
                writeln!(f, "     - Risk: {}", c.risk_level)?;
            }
        }
        writeln!(f, "{DOUBLE_RULE}")
    }

    fn write_report(&self, f: &mut String) -> fmt::Result {
        let detection = self.detection;

        writeln!(f, "{DOUBLE_RULE}")?;
        writeln!(f, "PCTD HARDWARE TROJAN DETECTION REPORT")?;
        writeln!(f, "{DOUBLE_RULE}\n")?;

        match self.design {
            Some(path) => writeln!(f, "Verilog File: {}", path.display())?,
            None => writeln!(f, "Verilog File: (none, name rules only)")?,
        }
        writeln!(f, "Transition Data: {}", self.transitions.display())?;
        writeln!(
            f,
            "Detection Threshold: Bottom {}% of activity",
            self.percentile
        )?;
        if let Some(t) = detection.threshold {
            writeln!(f, "Threshold Count: {} transitions", t.value)?;
        }
        writeln!(f)?;

        writeln!(f, "{RULE}")?;
        writeln!(f, "ANALYSIS SUMMARY")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total signals analyzed: {}", detection.signals_analyzed)?;
        writeln!(
            f,
            "Suspicious signals found: {}",
            detection.suspicious.len()
        )?;
        writeln!(
            f,
            "Trojan candidates (DFF signals): {}",
            detection.candidates.len()
        )?;
        writeln!(f, "Average transitions: {:.2}\n", detection.average)?;

        if detection.candidates.is_empty() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "NO TROJAN CANDIDATES DETECTED")?;
            writeln!(f, "{RULE}")?;
            writeln!(f, "All DFF signals show normal activity levels.")?;
        } else {
            self.write_candidates(f)?;
        }

        writeln!(f, "\n{DOUBLE_RULE}")?;
        writeln!(f, "RECOMMENDATIONS")?;
        writeln!(f, "{DOUBLE_RULE}")?;
        if detection.candidates.is_empty() {
            writeln!(f, "1. Circuit shows normal transition patterns")?;
            writeln!(
                f,
                "2. Consider testing with different stimuli for comprehensive coverage"
            )?;
            writeln!(f, "3. No immediate Trojan indicators detected")?;
        } else {
            writeln!(
                f,
                "1. Manually inspect the identified suspicious signals in the Verilog code"
            )?;
            writeln!(f, "2. Check connectivity and control flow of flagged signals")?;
            writeln!(
                f,
                "3. Verify if low activity is intentional (e.g., error handling paths)"
            )?;
            writeln!(
                f,
                "4. Consider extended simulation with different test vectors"
            )?;
        }
        Ok(())
    }

    fn write_candidates(&self, f: &mut String) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "TROJAN CANDIDATES (Ranked by suspicion)")?;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "{:<30} {:>10} {:>10} {:>10} {:>10}  Rule",
            "Signal Name", "Trans", "% Avg", "Prob", "Risk"
        )?;
        writeln!(f, "{RULE}")?;
        for c in &self.detection.candidates {
            writeln!(
                f,
                "{:<30} {:>10} {:>9.2}% {:>9.1}% {:>10}  {}",
                c.signal_name,
                c.transition_count,
                c.percentage_of_average,
                c.trojan_probability,
                c.risk_level.as_str(),
                c.matched_rule
            )?;
        }

        let mut critical = self.detection.critical().peekable();
        if critical.peek().is_none() {
            return Ok(());
        }
        writeln!(f, "\n{ALARM_RULE}")?;
        writeln!(f, "CRITICAL FINDINGS - IMMEDIATE INVESTIGATION REQUIRED")?;
        writeln!(f, "{ALARM_RULE}")?;
        for c in critical {
            writeln!(f, "\nSignal: {}", c.signal_name)?;
            writeln!(
                f,
                "  Transitions: {} ({:.2}% of average)",
                c.transition_count, c.percentage_of_average
            )?;
            writeln!(f, "  Trojan Probability: {:.1}%", c.trojan_probability)?;
            writeln!(f, "  Risk Level: {}", c.risk_level)?;
            writeln!(f, "  Matched Rule: {}", c.matched_rule)?;
            writeln!(
                f,
                "  Recommendation: Manual inspection of signal usage and connectivity"
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for DetectionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_report(&mut out)?;
        f.write_str(&out)
    }
}
