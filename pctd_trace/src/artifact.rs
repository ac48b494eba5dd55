//! The transition artifact exchanged between extraction and detection.
//!
//! Written shape:
//! ```json
//! { "frequencies": { "sig": 0.01 }, "transition_counts": { "sig": 3 } }
//! ```
//! Older extractors wrote the `name -> count` mapping as the top-level
//! object. Both shapes load into the same [`ActivityCounts`].

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::ArtifactError;

/// Key of the counts mapping in the wrapped shape.
const COUNTS_KEY: &str = "transition_counts";

/// Serializable per-signal activity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionArtifact {
    /// Transitions per nanosecond keyed by signal name.
    pub frequencies: IndexMap<String, f64>,
    /// Transition counts keyed by signal name.
    pub transition_counts: IndexMap<String, u64>,
}

impl TransitionArtifact {
    /// Pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact as pretty-printed JSON.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved {} signals to {}", self.transition_counts.len(), path.display());
        Ok(())
    }

    /// Counts view of this artifact.
    #[must_use]
    pub fn counts(&self) -> ActivityCounts {
        ActivityCounts::from(self.transition_counts.clone())
    }
}

/// Insertion-ordered transition counts keyed by signal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    counts: IndexMap<String, u64>,
    skipped: usize,
}

impl From<IndexMap<String, u64>> for ActivityCounts {
    fn from(counts: IndexMap<String, u64>) -> Self {
        Self { counts, skipped: 0 }
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for ActivityCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(name, count)| (name.into(), count))
                .collect::<IndexMap<_, _>>(),
        )
    }
}

impl ActivityCounts {
    /// Parse either artifact shape.
    ///
    /// Entries whose value is not a non-negative integer are skipped with a
    /// warning. A document that is not an object, or whose counts mapping
    /// is not an object, is malformed.
    pub fn from_json(text: &str) -> Result<Self, ArtifactError> {
        let document: Value = serde_json::from_str(text)?;
        let Value::Object(mut top) = document else {
            return Err(ArtifactError::malformed("top-level value is not an object"));
        };

        let mapping = match top.remove(COUNTS_KEY) {
            Some(Value::Object(counts)) => counts,
            Some(other) => {
                return Err(ArtifactError::malformed(format!(
                    "`{COUNTS_KEY}` must be an object, found {}",
                    json_type(&other)
                )));
            }
            // Legacy shape: the document itself is the mapping.
            None => top,
        };

        let mut counts = IndexMap::with_capacity(mapping.len());
        let mut skipped = 0;
        for (name, value) in mapping {
            match as_count(&value) {
                Some(count) => {
                    counts.insert(name, count);
                }
                None => {
                    warn!("Ignoring {name}: {} is not a transition count", value);
                    skipped += 1;
                }
            }
        }
        let counts = Self { counts, skipped };
        if counts.all_skipped() {
            warn!(
                "None of the {skipped} entries held a transition count; \
                 the artifact may hold frequencies only"
            );
        }
        Ok(counts)
    }

    /// Read and parse an artifact file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let counts = Self::from_json(&text)?;
        info!("Loaded data for {} signals from {}", counts.len(), path.display());
        Ok(counts)
    }

    /// Count for a signal.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Number of signals with a count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if there are no counts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries dropped while loading because they were not counts.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns true if entries were present but none could be used.
    #[must_use]
    pub fn all_skipped(&self) -> bool {
        self.counts.is_empty() && self.skipped > 0
    }

    /// Mean over all counts, zero included; 0.0 when empty.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.counts.values().sum::<u64>() as f64 / self.counts.len() as f64
    }

    /// Smallest count.
    #[must_use]
    pub fn min(&self) -> Option<u64> {
        self.counts.values().copied().min()
    }

    /// Largest count.
    #[must_use]
    pub fn max(&self) -> Option<u64> {
        self.counts.values().copied().max()
    }
}

fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    let integral = f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64;
    integral.then_some(f as u64)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
