//! Per-backend invocation counts.

use std::collections::BTreeMap;

/// Target name → number of dispatched commands.
///
/// Counts only grow.  Skipped commands never reach [`Stats::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    counts: BTreeMap<String, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one dispatch to `target`.
    pub fn record(&mut self, target: &str) {
        match self.counts.get_mut(target) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(target.to_owned(), 1);
            }
        }
    }

    pub fn count(&self, target: &str) -> u64 {
        self.counts.get(target).copied().unwrap_or(0)
    }

    /// Snapshot of all counts; each target appears once.
    pub fn summary(&self) -> BTreeMap<String, u64> {
        self.counts.clone()
    }

    /// Total dispatches across all targets.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
