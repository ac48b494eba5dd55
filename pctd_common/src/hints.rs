//! Register name hints harvested from a design description.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// An ordered set of names believed to be register outputs.
///
/// Matching is substring containment in either direction, so a short hint
/// such as `q` matches every name containing a `q`. This is a known source
/// of false positives and is kept as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSet {
    names: IndexSet<String>,
}

impl HintSet {
    /// Create an empty hint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint. Empty strings are ignored since they would match everything.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.names.insert(name)
    }

    /// Number of distinct hints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no hints are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate hints in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Find the first hint that contains `signal` or is contained in it.
    #[must_use]
    pub fn matching(&self, signal: &str) -> Option<&str> {
        self.iter()
            .find(|hint| hint.contains(signal) || signal.contains(hint))
    }
}

impl<S: Into<String>> FromIterator<S> for HintSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for HintSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}
