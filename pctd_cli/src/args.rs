use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use pctd_common::{ConfigError, DecodeOptions, DetectorConfig, RuleSetKind};

/// PCTD - rank low-activity flip-flops in a simulation trace as hardware trojan suspects
#[derive(Parser, Debug)]
#[command(name = "pctd")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count transitions in a VCD trace and write the activity artifacts
    Extract(ExtractArgs),
    /// Score a transition artifact against a design
    Detect(DetectArgs),
    /// Extract and detect in one pass
    Run(RunArgs),
}

/// Options for decoding a trace
#[derive(ClapArgs, Debug, Clone)]
pub struct TraceOptions {
    /// Key signals by their scope-qualified name (e.g. tb.dut.state_reg)
    #[arg(long, default_value_t = false)]
    pub hierarchical: bool,

    /// Maximum number of skipped lines to keep with their line numbers
    #[arg(long, default_value_t = 1000)]
    pub max_diagnostics: usize,
}

/// Options for the anomaly scorer
#[derive(ClapArgs, Debug, Clone)]
pub struct ScoreOptions {
    /// Percentile of positive transition counts used as the low-activity threshold
    #[arg(short = 'p', long, default_value_t = 10.0)]
    pub percentile: f64,

    /// Name rules used to recognize register-like signals
    #[arg(long, value_enum, default_value = "detection")]
    pub rules: RuleSetArg,
}

#[derive(ClapArgs, Debug)]
pub struct ExtractArgs {
    /// VCD trace to analyze
    pub trace: PathBuf,

    /// Directory receiving the JSON artifacts
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Statistics report path (defaults to <out-dir>/transition_report.txt)
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub trace_options: TraceOptions,
}

#[derive(ClapArgs, Debug)]
pub struct DetectArgs {
    /// Verilog source providing register hints
    pub design: PathBuf,

    /// Transition artifact written by `extract`
    pub transitions: PathBuf,

    /// Detection report path
    #[arg(long, default_value = "pctd_detection_report.txt")]
    pub report: PathBuf,

    #[command(flatten)]
    pub score_options: ScoreOptions,
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// VCD trace to analyze
    pub trace: PathBuf,

    /// Verilog source providing register hints
    #[arg(short = 'd', long)]
    pub design: Option<PathBuf>,

    /// Directory receiving artifacts and reports
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub trace_options: TraceOptions,

    #[command(flatten)]
    pub score_options: ScoreOptions,
}

impl TraceOptions {
    /// Convert command-line arguments into decoder options
    pub fn to_options(&self) -> DecodeOptions {
        DecodeOptions {
            hierarchical_names: self.hierarchical,
            max_diagnostics: self.max_diagnostics,
            ..DecodeOptions::default()
        }
    }
}

impl ScoreOptions {
    /// Convert command-line arguments into a detector configuration
    pub fn to_config(&self) -> Result<DetectorConfig, ConfigError> {
        DetectorConfig::builder()
            .low_activity_percentile(self.percentile)
            .rule_set(self.rules.clone().into())
            .build()
    }
}

impl RunArgs {
    /// Combined decode and scoring configuration
    pub fn to_config(&self) -> Result<DetectorConfig, ConfigError> {
        DetectorConfig::builder()
            .low_activity_percentile(self.score_options.percentile)
            .rule_set(self.score_options.rules.clone().into())
            .decode_options(self.trace_options.to_options())
            .build()
    }
}

/// Command-line argument wrapper for RuleSetKind
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum RuleSetArg {
    /// The five ranking rules (_reg, _q, state, count, shift)
    #[value(name = "detection")]
    Detection,
    /// The wider export list (adds dff, cntr, _ff, q[..], ...)
    #[value(name = "extended")]
    Extended,
}

impl From<RuleSetArg> for RuleSetKind {
    fn from(arg: RuleSetArg) -> Self {
        match arg {
            RuleSetArg::Detection => RuleSetKind::Detection,
            RuleSetArg::Extended => RuleSetKind::Extended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect() {
        let args = Args::try_parse_from([
            "pctd",
            "detect",
            "uart.v",
            "dff.json",
            "--percentile",
            "5",
            "--rules",
            "extended",
        ])
        .unwrap();
        let Command::Detect(detect) = args.command else {
            panic!("expected detect");
        };
        let config = detect.score_options.to_config().unwrap();
        assert_eq!(config.low_activity_percentile, 5.0);
        assert_eq!(config.rule_set, RuleSetKind::Extended);
        assert_eq!(detect.report, PathBuf::from("pctd_detection_report.txt"));
    }

    #[test]
    fn test_run_rejects_bad_percentile() {
        let args = Args::try_parse_from(["pctd", "run", "t.vcd", "-p", "150"]).unwrap();
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert!(matches!(run.to_config(), Err(ConfigError::Percentile(_))));
    }

    #[test]
    fn test_run_carries_decode_options() {
        let args = Args::try_parse_from([
            "pctd",
            "run",
            "t.vcd",
            "--hierarchical",
            "--max-diagnostics",
            "3",
        ])
        .unwrap();
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        let config = run.to_config().unwrap();
        assert!(config.decode.hierarchical_names);
        assert_eq!(config.decode.max_diagnostics, 3);
        assert_eq!(config.low_activity_percentile, 10.0);
    }

    #[test]
    fn test_extract_defaults() {
        let args =
            Args::try_parse_from(["pctd", "extract", "t.vcd", "--hierarchical"]).unwrap();
        let Command::Extract(extract) = args.command else {
            panic!("expected extract");
        };
        assert_eq!(extract.out_dir, PathBuf::from("."));
        assert!(extract.report.is_none());
        let options = extract.trace_options.to_options();
        assert!(options.hierarchical_names);
        assert_eq!(options.max_diagnostics, 1000);
        assert!(!options.retain_value_history);
    }
}
