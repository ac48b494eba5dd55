//! Plain-text transition frequency report.

use std::fmt::{self, Write as _};
use std::path::Path;

use crate::ActivityProfile;

/// Rows shown in the "all signals" table.
const TOP_SIGNALS: usize = 50;
/// Register signals below this fraction of the register mean are flagged.
const LOW_ACTIVITY_RATIO: f64 = 0.1;

const RULE: &str = "--------------------------------------------------------------------------------";
const DOUBLE_RULE: &str =
    "================================================================================";

/// Report over one trace and its register-only subset.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsReport<'a> {
    /// Trace the profile was derived from.
    pub source: &'a Path,
    /// All signals.
    pub profile: &'a ActivityProfile,
    /// Register-like signals only.
    pub registers: &'a ActivityProfile,
}

impl StatisticsReport<'_> {
    /// Render the report text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn write_table_header(f: &mut String, last_column: &str) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "{:<40} {:>15} {:>15}",
            "Signal Name", "Transitions", last_column
        )?;
        writeln!(f, "{RULE}")
    }

    fn write_report(&self, f: &mut String) -> fmt::Result {
        let stats = &self.profile.summary;

        writeln!(f, "{DOUBLE_RULE}")?;
        writeln!(f, "TRANSITION FREQUENCY ANALYSIS REPORT")?;
        writeln!(f, "{DOUBLE_RULE}\n")?;

        writeln!(f, "VCD File: {}", self.source.display())?;
        writeln!(
            f,
            "Simulation Time: {} {}",
            self.profile.simulation_time, self.profile.time_unit
        )?;
        writeln!(f, "Total Signals: {}", stats.total_signals)?;
        writeln!(
            f,
            "DFF Signals Identified: {}\n",
            self.registers.transition_counts.len()
        )?;

        writeln!(f, "STATISTICS:")?;
        writeln!(f, "  Transition Counts:")?;
        writeln!(f, "    Min: {}", stats.min_transitions)?;
        writeln!(f, "    Max: {}", stats.max_transitions)?;
        writeln!(f, "    Avg: {:.2}\n", stats.avg_transitions)?;
        writeln!(f, "  Frequencies:")?;
        writeln!(f, "    Min: {:.6e}", stats.min_frequency)?;
        writeln!(f, "    Max: {:.6e}", stats.max_frequency)?;
        writeln!(f, "    Avg: {:.6e}\n", stats.avg_frequency)?;
        writeln!(
            f,
            "  Signals with zero transitions: {}\n",
            stats.zero_transitions
        )?;

        writeln!(f, "{RULE}")?;
        writeln!(f, "ALL SIGNALS (Top {TOP_SIGNALS} by transition count)")?;
        Self::write_table_header(f, "Frequency")?;
        for (name, count) in self.profile.by_activity().into_iter().take(TOP_SIGNALS) {
            let freq = self.profile.frequencies.get(name).copied().unwrap_or(0.0);
            writeln!(f, "{name:<40} {count:>15} {freq:>15.6e}")?;
        }

        writeln!(f, "\n{RULE}")?;
        writeln!(f, "DFF SIGNALS ONLY")?;
        Self::write_table_header(f, "Frequency")?;
        for (name, count) in self.registers.by_activity() {
            let freq = self.registers.frequencies.get(name).copied().unwrap_or(0.0);
            writeln!(f, "{name:<40} {count:>15} {freq:>15.6e}")?;
        }

        self.write_low_activity(f)
    }

    fn write_low_activity(&self, f: &mut String) -> fmt::Result {
        if self.registers.transition_counts.is_empty() {
            return Ok(());
        }
        let threshold = self.registers.summary.avg_transitions * LOW_ACTIVITY_RATIO;
        let mut suspicious = self
            .registers
            .transition_counts
            .iter()
            .filter(|(_, count)| (**count as f64) < threshold)
            .collect::<Vec<_>>();
        if suspicious.is_empty() {
            return Ok(());
        }
        suspicious.sort_by_key(|(_, count)| **count);

        let avg = self.profile.summary.avg_transitions;
        writeln!(f, "\n{RULE}")?;
        writeln!(f, "WARNING: SUSPICIOUS LOW-ACTIVITY DFF SIGNALS")?;
        writeln!(
            f,
            "    (Less than 10% of average: {threshold:.2} transitions)"
        )?;
        Self::write_table_header(f, "% of Avg")?;
        for (name, count) in suspicious {
            let pct = if avg > 0.0 {
                *count as f64 / avg * 100.0
            } else {
                0.0
            };
            writeln!(f, "{name:<40} {count:>15} {pct:>14.2}%")?;
        }
        Ok(())
    }
}

impl fmt::Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_report(&mut out)?;
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeUnit;
    use indexmap::IndexMap;

    fn profile(pairs: &[(&str, u64)]) -> ActivityProfile {
        let counts = pairs
            .iter()
            .map(|(n, c)| (n.to_string(), *c))
            .collect::<IndexMap<_, _>>();
        ActivityProfile::from_counts(counts, TimeUnit::default(), 1000)
    }

    #[test]
    fn test_low_activity_section_lists_sleepy_registers() {
        let all = profile(&[("clk", 1000), ("trigger_reg", 1), ("data_reg", 400)]);
        let regs = all.subset(|n| n.ends_with("_reg"));
        let text = StatisticsReport {
            source: Path::new("uart.vcd"),
            profile: &all,
            registers: &regs,
        }
        .render();

        assert!(text.contains("VCD File: uart.vcd"));
        assert!(text.contains("DFF Signals Identified: 2"));
        assert!(text.contains("WARNING: SUSPICIOUS LOW-ACTIVITY DFF SIGNALS"));
        let warning = text.split("WARNING").nth(1).unwrap();
        assert!(warning.contains("trigger_reg"));
        assert!(!warning.contains("data_reg"));
    }

    #[test]
    fn test_no_warning_without_registers() {
        let all = profile(&[("clk", 10)]);
        let regs = all.subset(|_| false);
        let text = StatisticsReport {
            source: Path::new("t.vcd"),
            profile: &all,
            registers: &regs,
        }
        .render();
        assert!(!text.contains("WARNING"));
        assert!(text.contains("DFF SIGNALS ONLY"));
    }
}
