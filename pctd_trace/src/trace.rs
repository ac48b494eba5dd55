//! The decoded trace aggregate.

use indexmap::IndexMap;

use crate::{Signal, TimeUnit};

/// Everything a decode pass learned about a trace.
///
/// Signals are keyed by their file-local code in declaration order. The
/// aggregate is built by the decoder and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub(crate) signals: IndexMap<String, Signal>,
    pub(crate) time_unit: TimeUnit,
    pub(crate) simulation_time: u64,
    pub(crate) hierarchical_names: bool,
}

impl Trace {
    /// Signals in declaration order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Look up a signal by its code.
    #[must_use]
    pub fn signal(&self, code: &str) -> Option<&Signal> {
        self.signals.get(code)
    }

    /// Number of declared codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if no signal was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Declared time unit (`1ns` when none was declared).
    #[must_use]
    pub const fn time_unit(&self) -> &TimeUnit {
        &self.time_unit
    }

    /// Largest timestamp seen, in trace ticks.
    #[must_use]
    pub const fn simulation_time(&self) -> u64 {
        self.simulation_time
    }

    /// Largest timestamp seen, in nanoseconds.
    #[must_use]
    pub fn simulation_time_ns(&self) -> f64 {
        self.simulation_time as f64 * self.time_unit.ns_multiplier()
    }

    /// Key under which a signal is reported.
    #[must_use]
    pub fn report_name(&self, signal: &Signal) -> String {
        if self.hierarchical_names {
            signal.qualified_name()
        } else {
            signal.name().to_string()
        }
    }

    /// Transition counts keyed by report name.
    ///
    /// Codes that share a report name are summed. Every declared signal is
    /// present, including those that never toggled.
    #[must_use]
    pub fn transition_counts(&self) -> IndexMap<String, u64> {
        let mut counts: IndexMap<String, u64> = IndexMap::with_capacity(self.signals.len());
        for signal in self.signals.values() {
            *counts.entry(self.report_name(signal)).or_default() += signal.transition_count();
        }
        counts
    }

    /// Number of signals with at least one counted transition.
    #[must_use]
    pub fn active_signals(&self) -> usize {
        self.signals
            .values()
            .filter(|s| s.transition_count() > 0)
            .count()
    }
}
