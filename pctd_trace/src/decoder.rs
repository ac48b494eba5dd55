//! Streaming decoder for Value Change Dump traces.
//!
//! The decoder is a line-at-a-time state machine. It keeps one [`Signal`]
//! per declared code and never buffers value changes, so memory grows with
//! the number of distinct signals rather than with the trace length.
//!
//! Line handling, in order:
//! - `$timescale` sets the unit, possibly spread over the following lines.
//!   A keyword or `#` line closes an unterminated block and is then handled
//!   normally.
//! - `$scope` / `$upscope` maintain the scope path used for qualified names.
//! - `$var` declares a signal (at least five tokens, extra tokens ignored).
//! - `#<n>` sets the current time and opens the value-change section.
//! - other `$` keyword lines are ignored.
//! - inside the value-change section: scalar `<sym><code>`, vector
//!   `b<bits> <code>` and real `r<num> <code>` changes.
//!
//! Anything else is skipped and reported through [`Diagnostics`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pctd_common::DecodeOptions;
use tracing::{debug, info, warn};

use crate::{
    Diagnostics, LineOutcome, Signal, SignalKind, SkipReason, TimeUnit, Trace, TraceError,
};

/// Cooperative cancellation flag checked between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that any decode holding this token stops at the next line.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a decode pass.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The signal table and timing information.
    pub trace: Trace,
    /// Lines that could not be used.
    pub diagnostics: Diagnostics,
    /// Number of lines read.
    pub lines: usize,
    /// True if the pass stopped early on cancellation.
    pub interrupted: bool,
}

/// Streaming trace decoder.
#[derive(Debug, Clone, Default)]
pub struct TraceDecoder {
    options: DecodeOptions,
    cancel: Option<CancelToken>,
}

impl TraceDecoder {
    /// Create a decoder with the given retention options.
    #[must_use]
    pub const fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    /// Stop decoding when `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Decode a trace file.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<Decoded, TraceError> {
        let path = path.as_ref();
        info!("Parsing VCD file: {}", path.display());
        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode(BufReader::new(file))
    }

    /// Decode an in-memory trace.
    pub fn decode_str(&self, text: &str) -> Decoded {
        // Reading from a byte slice cannot fail.
        match self.decode(text.as_bytes()) {
            Ok(decoded) => decoded,
            Err(e) => unreachable!("in-memory read failed: {e}"),
        }
    }

    /// Decode from any buffered reader.
    ///
    /// Invalid UTF-8 is replaced lossily. Only an I/O failure of the reader
    /// itself is an error.
    pub fn decode<R: BufRead>(&self, mut reader: R) -> Result<Decoded, TraceError> {
        let mut state = DecodeState::new(&self.options);
        let mut buf = Vec::new();
        let mut interrupted = false;

        loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                interrupted = true;
                warn!("Decode cancelled after {} lines", state.line_number);
                break;
            }
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| TraceError::Read {
                    line: state.line_number,
                    source,
                })?;
            if read == 0 {
                break;
            }
            state.line_number += 1;
            let line = String::from_utf8_lossy(&buf);
            state.feed(line.trim());
        }

        let decoded = state.finish(interrupted);
        info!(
            "Total simulation time: {} {}",
            decoded.trace.simulation_time(),
            decoded.trace.time_unit()
        );
        info!("Total signals parsed: {}", decoded.trace.len());
        info!("Signals with transitions: {}", decoded.trace.active_signals());
        if !decoded.diagnostics.is_empty() {
            info!(
                "Skipped {} lines while decoding",
                decoded.diagnostics.total_skipped()
            );
        }
        Ok(decoded)
    }
}

/// Progress of a `$timescale` block spanning several lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimescaleState {
    Idle,
    Pending { found: bool, line: usize },
}

struct DecodeState<'a> {
    options: &'a DecodeOptions,
    trace: Trace,
    diagnostics: Diagnostics,
    scopes: Vec<String>,
    timescale: TimescaleState,
    current_time: u64,
    in_value_changes: bool,
    line_number: usize,
}

impl<'a> DecodeState<'a> {
    fn new(options: &'a DecodeOptions) -> Self {
        Self {
            options,
            trace: Trace {
                hierarchical_names: options.hierarchical_names,
                ..Trace::default()
            },
            diagnostics: Diagnostics::new(options.max_diagnostics),
            scopes: Vec::new(),
            timescale: TimescaleState::Idle,
            current_time: 0,
            in_value_changes: false,
            line_number: 0,
        }
    }

    fn feed(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if let LineOutcome::Skipped(reason) = self.apply_line(line) {
            self.skip(self.line_number, reason, line);
        }
    }

    fn skip(&mut self, line_number: usize, reason: SkipReason, text: &str) {
        if let Some(record) = self.diagnostics.push(line_number, reason, text) {
            warn!("Skipping {record}");
        } else if reason.is_recorded() {
            debug!("Skipping line {line_number}: {reason}");
        }
    }

    fn apply_line(&mut self, line: &str) -> LineOutcome {
        if let TimescaleState::Pending { found, line: start } = self.timescale {
            let interrupts = (line.starts_with('$') && !line.starts_with("$end"))
                || line.starts_with('#');
            if !interrupts {
                return self.continue_timescale(line, found, start);
            }
            self.abandon_timescale(found, start);
        }

        if line.starts_with("$timescale") {
            self.start_timescale(line)
        } else if line.starts_with("$upscope") {
            self.scopes.pop();
            LineOutcome::Applied
        } else if line.starts_with("$scope") {
            self.open_scope(line)
        } else if line.starts_with("$var") {
            self.declare(line)
        } else if let Some(time) = line.strip_prefix('#') {
            self.set_time(time)
        } else if line.starts_with('$') || !self.in_value_changes {
            LineOutcome::Ignored
        } else {
            self.apply_value_change(line)
        }
    }

    fn start_timescale(&mut self, line: &str) -> LineOutcome {
        if let Some(unit) = TimeUnit::from_declaration(line) {
            debug!("Timescale: {unit}");
            self.trace.time_unit = unit;
            return LineOutcome::Applied;
        }
        if line.split_whitespace().count() == 1 {
            // `$timescale` alone; the unit follows on its own line.
            self.timescale = TimescaleState::Pending {
                found: false,
                line: self.line_number,
            };
            return LineOutcome::Applied;
        }
        self.trace.time_unit = TimeUnit::default();
        LineOutcome::Skipped(SkipReason::MalformedTimescale)
    }

    fn continue_timescale(&mut self, line: &str, found: bool, start: usize) -> LineOutcome {
        let mut found = found;
        if !found {
            if let Some(unit) = TimeUnit::search(line) {
                debug!("Timescale: {unit}");
                self.trace.time_unit = unit;
                found = true;
            }
        }
        if line.contains("$end") {
            self.timescale = TimescaleState::Idle;
            if !found {
                self.trace.time_unit = TimeUnit::default();
                return LineOutcome::Skipped(SkipReason::MalformedTimescale);
            }
        } else {
            self.timescale = TimescaleState::Pending { found, line: start };
        }
        LineOutcome::Applied
    }

    /// Close a `$timescale` block that never reached `$end`.
    fn abandon_timescale(&mut self, found: bool, start: usize) {
        self.timescale = TimescaleState::Idle;
        if !found {
            self.trace.time_unit = TimeUnit::default();
        }
        self.skip(start, SkipReason::MalformedTimescale, "$timescale");
    }

    fn open_scope(&mut self, line: &str) -> LineOutcome {
        match line.split_whitespace().nth(2) {
            Some(name) if name != "$end" => {
                self.scopes.push(name.to_string());
                LineOutcome::Applied
            }
            _ => LineOutcome::Skipped(SkipReason::MalformedScope),
        }
    }

    fn declare(&mut self, line: &str) -> LineOutcome {
        let parts = line.split_whitespace().collect::<Vec<_>>();
        let [_, var_type, width, code, name, ..] = parts.as_slice() else {
            return LineOutcome::Skipped(SkipReason::MalformedDeclaration);
        };
        let Ok(bit_width) = width.parse::<usize>() else {
            return LineOutcome::Skipped(SkipReason::InvalidWidth);
        };

        let mut signal =
            Signal::new(*code, *name, *var_type, bit_width).with_scope(self.scopes.join("."));
        if self.options.retain_value_history && self.options.history_depth > 0 {
            signal = signal.with_history(self.options.history_depth);
        }
        if let Some(previous) = self.trace.signals.insert((*code).to_string(), signal) {
            debug!(
                "Code {} redeclared, replacing {}",
                previous.code(),
                previous.qualified_name()
            );
        }
        LineOutcome::Applied
    }

    fn set_time(&mut self, time: &str) -> LineOutcome {
        match time.trim().parse::<u64>() {
            Ok(time) => {
                self.current_time = time;
                self.trace.simulation_time = self.trace.simulation_time.max(time);
                self.in_value_changes = true;
                LineOutcome::Applied
            }
            Err(_) => LineOutcome::Skipped(SkipReason::MalformedTimestamp),
        }
    }

    fn apply_value_change(&mut self, line: &str) -> LineOutcome {
        let Some(first) = line.chars().next() else {
            return LineOutcome::Ignored;
        };
        match first {
            '0' | '1' | 'x' | 'X' | 'z' | 'Z' => {
                // The symbol is ASCII, so slicing after one byte is safe.
                let code = &line[1..];
                if code.is_empty() {
                    return LineOutcome::Skipped(SkipReason::MissingCode);
                }
                let value = first.to_ascii_lowercase().to_string();
                self.observe(code, SignalKind::Scalar, &value)
            }
            'b' | 'B' | 'r' | 'R' => {
                let kind = if first.eq_ignore_ascii_case(&'b') {
                    SignalKind::Vector
                } else {
                    SignalKind::Real
                };
                let mut parts = line.split_whitespace();
                let (Some(token), Some(code)) = (parts.next(), parts.next()) else {
                    return LineOutcome::Skipped(SkipReason::MissingCode);
                };
                self.observe(code, kind, &token[1..])
            }
            _ => LineOutcome::Skipped(SkipReason::UnrecognizedValueChange),
        }
    }

    fn observe(&mut self, code: &str, kind: SignalKind, value: &str) -> LineOutcome {
        match self.trace.signals.get_mut(code) {
            Some(signal) => {
                signal.observe(self.current_time, kind, value);
                LineOutcome::Applied
            }
            None => LineOutcome::Skipped(SkipReason::UnknownCode),
        }
    }

    fn finish(mut self, interrupted: bool) -> Decoded {
        if let TimescaleState::Pending { found, line } = self.timescale {
            self.abandon_timescale(found, line);
        }
        Decoded {
            trace: self.trace,
            diagnostics: self.diagnostics,
            lines: self.line_number,
            interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Decoded {
        TraceDecoder::default().decode_str(text)
    }

    #[test]
    fn test_multi_line_timescale() {
        let decoded = decode("$timescale\n  1ps\n$end\n");
        assert_eq!(decoded.trace.time_unit().as_str(), "1ps");
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_timescale_unit_falls_back() {
        let decoded = decode("$timescale\n$end\n");
        assert_eq!(decoded.trace.time_unit().as_str(), "1ns");
        assert_eq!(decoded.diagnostics.total(SkipReason::MalformedTimescale), 1);
    }

    #[test]
    fn test_unit_on_timescale_line_without_end() {
        let decoded = decode(concat!(
            "$timescale 1ps\n",
            "$var wire 1 ! a $end\n",
            "$enddefinitions $end\n",
            "#0\n0!\n#1\n1!\n",
        ));
        assert_eq!(decoded.trace.time_unit().as_str(), "1ps");
        assert_eq!(decoded.trace.len(), 1);
        assert_eq!(decoded.trace.signal("!").unwrap().transition_count(), 1);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_timescale_keeps_declarations() {
        let decoded = decode("$timescale\n$var reg 1 a state $end\n#0\n0a\n#1\n1a\n");
        assert_eq!(decoded.trace.time_unit().as_str(), "1ns");
        assert_eq!(decoded.trace.len(), 1);
        assert_eq!(decoded.trace.signal("a").unwrap().transition_count(), 1);
        assert_eq!(decoded.diagnostics.total(SkipReason::MalformedTimescale), 1);
        assert_eq!(decoded.diagnostics.records()[0].line, 1);
    }

    #[test]
    fn test_unit_line_without_end_closed_by_timestamp() {
        let decoded = decode("$var wire 1 ! a $end\n$timescale\n10 us\n#0\n0!\n#5\n1!\n");
        assert_eq!(decoded.trace.time_unit().as_str(), "10 us");
        assert_eq!(decoded.trace.simulation_time(), 5);
        assert_eq!(decoded.trace.signal("!").unwrap().transition_count(), 1);
        assert_eq!(decoded.diagnostics.total(SkipReason::MalformedTimescale), 1);
    }

    #[test]
    fn test_timescale_open_at_end_of_input() {
        let decoded = decode("$timescale\n");
        assert_eq!(decoded.trace.time_unit().as_str(), "1ns");
        assert_eq!(decoded.diagnostics.total(SkipReason::MalformedTimescale), 1);
    }

    #[test]
    fn test_zero_history_depth_retains_nothing() {
        let options = DecodeOptions {
            retain_value_history: true,
            history_depth: 0,
            ..DecodeOptions::default()
        };
        let decoded =
            TraceDecoder::new(options).decode_str("$var wire 1 ! a $end\n#0\n0!\n#1\n1!\n");
        let signal = decoded.trace.signal("!").unwrap();
        assert_eq!(signal.transition_count(), 1);
        assert!(signal.history().is_none());
    }

    #[test]
    fn test_scope_tracking() {
        let decoded = decode(concat!(
            "$scope module tb $end\n",
            "$scope module dut $end\n",
            "$var reg 1 ! state_q $end\n",
            "$upscope $end\n",
            "$var wire 1 \" clk $end\n",
            "$upscope $end\n",
        ));
        assert_eq!(decoded.trace.signal("!").unwrap().scope(), "tb.dut");
        assert_eq!(decoded.trace.signal("\"").unwrap().scope(), "tb");
    }

    #[test]
    fn test_value_changes_before_first_timestamp_ignored() {
        let decoded = decode("$var wire 1 ! a $end\n1!\n0!\n#0\n1!\n");
        let signal = decoded.trace.signal("!").unwrap();
        assert_eq!(signal.transition_count(), 0);
        assert_eq!(signal.last_value(), Some("1"));
    }

    #[test]
    fn test_redeclared_code_replaces_signal() {
        let decoded = decode("$var wire 1 ! a $end\n$var wire 1 ! b $end\n");
        assert_eq!(decoded.trace.len(), 1);
        assert_eq!(decoded.trace.signal("!").unwrap().name(), "b");
    }

    #[test]
    fn test_real_values_count_any_change() {
        let decoded = decode("$var real 64 % v $end\n#0\nr0.5 %\n#1\nr0.5 %\n#2\nR1.25 %\n");
        let signal = decoded.trace.signal("%").unwrap();
        assert_eq!(signal.kind(), SignalKind::Real);
        assert_eq!(signal.transition_count(), 1);
        assert_eq!(signal.last_value(), Some("1.25"));
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let decoded = TraceDecoder::default()
            .with_cancel(token)
            .decode_str("$var wire 1 ! a $end\n");
        assert!(decoded.interrupted);
        assert_eq!(decoded.lines, 0);
        assert!(decoded.trace.is_empty());
    }
}
