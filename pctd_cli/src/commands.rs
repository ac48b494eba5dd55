//! Subcommand implementations.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use pctd_common::{DecodeOptions, HintSet};
use pctd_detect::{DetectionReport, Detector, RegisterClassifier, RuleSet};
use pctd_trace::{ActivityProfile, StatisticsReport, TraceDecoder};
use tracing::{info, warn};

use crate::args::{DetectArgs, ExtractArgs, RunArgs};

/// All-signal artifact name.
pub const ALL_SIGNALS_JSON: &str = "transition_frequencies.json";
/// Register-only artifact name.
pub const REGISTER_SIGNALS_JSON: &str = "dff_transition_frequencies.json";
/// Statistics report name.
pub const STATISTICS_REPORT: &str = "transition_report.txt";
/// Detection report name.
pub const DETECTION_REPORT: &str = "pctd_detection_report.txt";

type CliResult<T> = Result<T, Box<dyn Error>>;

/// What `extract` produced.
pub struct Extracted {
    pub profile: ActivityProfile,
    pub all_signals: PathBuf,
}

pub fn extract(args: &ExtractArgs) -> CliResult<Extracted> {
    let options = args.trace_options.to_options();
    let report = args
        .report
        .clone()
        .unwrap_or_else(|| args.out_dir.join(STATISTICS_REPORT));
    extract_trace(&args.trace, &args.out_dir, &report, &options)
}

pub fn detect(args: &DetectArgs) -> CliResult<()> {
    let config = args.score_options.to_config()?;
    let detector = Detector::new(config)?.with_design(&args.design)?;
    let detection = detector.detect_file(&args.transitions)?;

    let report = DetectionReport {
        design: Some(args.design.as_path()),
        transitions: &args.transitions,
        detection: &detection,
        percentile: args.score_options.percentile,
    };
    write_text(&args.report, &report.render())?;
    info!("Report saved to: {}", args.report.display());
    println!("{}", report.summary());
    Ok(())
}

pub fn run(args: &RunArgs) -> CliResult<()> {
    let config = args.to_config()?;
    let statistics = args.out_dir.join(STATISTICS_REPORT);
    let extracted = extract_trace(&args.trace, &args.out_dir, &statistics, &config.decode)?;

    let mut detector = Detector::new(config)?;
    if let Some(design) = &args.design {
        detector = detector.with_design(design)?;
    }
    let counts = extracted.profile.to_artifact().counts();
    let detection = detector.detect(&counts);

    let report_path = args.out_dir.join(DETECTION_REPORT);
    let report = DetectionReport {
        design: args.design.as_deref(),
        transitions: &extracted.all_signals,
        detection: &detection,
        percentile: args.score_options.percentile,
    };
    write_text(&report_path, &report.render())?;
    info!("Report saved to: {}", report_path.display());
    println!("{}", report.summary());
    Ok(())
}

fn extract_trace(
    trace: &Path,
    out_dir: &Path,
    report: &Path,
    options: &DecodeOptions,
) -> CliResult<Extracted> {
    let decoded = TraceDecoder::new(options.clone()).decode_file(trace)?;
    if !decoded.diagnostics.is_empty() {
        warn!(
            "{} lines of {} were skipped",
            decoded.diagnostics.total_skipped(),
            decoded.lines
        );
    }

    let profile = ActivityProfile::from_trace(&decoded.trace);
    let classifier = RegisterClassifier::new(RuleSet::extended(), HintSet::new());
    let registers = profile.subset(|name| classifier.is_register(name));
    info!(
        "Identified {} DFF signals out of {}",
        registers.transition_counts.len(),
        profile.transition_counts.len()
    );

    fs::create_dir_all(out_dir)?;
    let all_signals = out_dir.join(ALL_SIGNALS_JSON);
    profile.to_artifact().write_to(&all_signals)?;
    registers
        .to_artifact()
        .write_to(out_dir.join(REGISTER_SIGNALS_JSON))?;

    let text = StatisticsReport {
        source: trace,
        profile: &profile,
        registers: &registers,
    }
    .render();
    write_text(report, &text)?;
    info!("Report saved to {}", report.display());

    println!(
        "Extracted {} signals ({} register-like) over {} {}",
        profile.summary.total_signals,
        registers.summary.total_signals,
        profile.simulation_time,
        profile.time_unit
    );
    Ok(Extracted {
        profile,
        all_signals,
    })
}

fn write_text(path: &Path, text: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()).into())
}

