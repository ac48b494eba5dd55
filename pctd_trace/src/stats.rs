//! Per-signal frequencies and corpus-wide activity statistics.

use indexmap::IndexMap;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::{TimeUnit, Trace, TransitionArtifact};

/// Corpus aggregates over every named signal, zero-count ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Number of signals.
    pub total_signals: usize,
    /// Smallest transition count.
    pub min_transitions: u64,
    /// Largest transition count.
    pub max_transitions: u64,
    /// Mean transition count.
    pub avg_transitions: f64,
    /// Smallest frequency (transitions per ns).
    pub min_frequency: f64,
    /// Largest frequency.
    pub max_frequency: f64,
    /// Mean frequency.
    pub avg_frequency: f64,
    /// Signals that never toggled.
    pub zero_transitions: usize,
}

impl ActivitySummary {
    /// Aggregate parallel count and frequency columns.
    ///
    /// An empty input yields the all-zero summary.
    #[must_use]
    pub fn compute(counts: &[u64], frequencies: &[f64]) -> Self {
        if counts.is_empty() {
            return Self::default();
        }
        let (min_transitions, max_transitions) = bounds(counts.iter().copied()).unwrap_or((0, 0));
        let (min_frequency, max_frequency) =
            bounds(frequencies.iter().copied()).unwrap_or((0.0, 0.0));
        let avg_frequency = if frequencies.is_empty() {
            0.0
        } else {
            frequencies.iter().sum::<f64>() / frequencies.len() as f64
        };

        Self {
            total_signals: counts.len(),
            min_transitions,
            max_transitions,
            avg_transitions: counts.iter().sum::<u64>() as f64 / counts.len() as f64,
            min_frequency,
            max_frequency,
            avg_frequency,
            zero_transitions: counts.iter().filter(|c| **c == 0).count(),
        }
    }
}

fn bounds<T, I>(values: I) -> Option<(T, T)>
where
    T: PartialOrd + Copy,
    I: Iterator<Item = T>,
{
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}

/// Activity of every signal of one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityProfile {
    /// Declared time unit.
    pub time_unit: TimeUnit,
    /// Largest timestamp, in trace ticks.
    pub simulation_time: u64,
    /// Largest timestamp, in nanoseconds.
    pub simulation_time_ns: f64,
    /// Transition counts keyed by signal name.
    pub transition_counts: IndexMap<String, u64>,
    /// Transitions per nanosecond keyed by signal name.
    pub frequencies: IndexMap<String, f64>,
    /// Aggregates over all signals above.
    pub summary: ActivitySummary,
}

impl ActivityProfile {
    /// Derive frequencies and aggregates from a decoded trace.
    #[must_use]
    pub fn from_trace(trace: &Trace) -> Self {
        Self::from_counts(
            trace.transition_counts(),
            trace.time_unit().clone(),
            trace.simulation_time(),
        )
    }

    /// Derive frequencies and aggregates from named counts.
    ///
    /// With zero simulated time every frequency is 0.0.
    #[must_use]
    pub fn from_counts(
        transition_counts: IndexMap<String, u64>,
        time_unit: TimeUnit,
        simulation_time: u64,
    ) -> Self {
        let simulation_time_ns = simulation_time as f64 * time_unit.ns_multiplier();
        let frequencies = transition_counts
            .iter()
            .map(|(name, count)| {
                let freq = if simulation_time_ns > 0.0 {
                    *count as f64 / simulation_time_ns
                } else {
                    0.0
                };
                (name.clone(), freq)
            })
            .collect::<IndexMap<_, _>>();

        let counts = transition_counts.values().copied().collect::<Vec<_>>();
        let freqs = frequencies.values().copied().collect::<Vec<_>>();
        let summary = ActivitySummary::compute(&counts, &freqs);

        Self {
            time_unit,
            simulation_time,
            simulation_time_ns,
            transition_counts,
            frequencies,
            summary,
        }
    }

    /// Narrow the profile to the signals accepted by `keep`, recomputing the
    /// aggregates over that subset.
    #[must_use]
    pub fn subset<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let transition_counts = self
            .transition_counts
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        Self::from_counts(transition_counts, self.time_unit.clone(), self.simulation_time)
    }

    /// Signals sorted by descending transition count, ties in trace order.
    #[must_use]
    pub fn by_activity(&self) -> Vec<(&str, u64)> {
        let mut rows = self
            .transition_counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    /// The serializable `{frequencies, transition_counts}` record.
    #[must_use]
    pub fn to_artifact(&self) -> TransitionArtifact {
        TransitionArtifact {
            frequencies: self.frequencies.clone(),
            transition_counts: self.transition_counts.clone(),
        }
    }
}
