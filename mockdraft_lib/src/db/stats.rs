use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking command outcomes for one database.
#[derive(Debug, Default)]
pub struct CommandStats {
    pub(crate) commands_opened: AtomicU64,
    pub(crate) queries: AtomicU64,
    pub(crate) non_queries: AtomicU64,
    pub(crate) failures: AtomicU64,
}

impl CommandStats {
    pub fn record_open(&self) {
        self.commands_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_query(&self) {
        self.non_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            commands_opened: self.commands_opened.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            non_queries: self.non_queries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of command counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub commands_opened: u64,
    pub queries: u64,
    pub non_queries: u64,
    pub failures: u64,
}

impl StatsSummary {
    /// Counter deltas since an earlier snapshot. Snapshots passed out of
    /// order yield zeros.
    pub fn since(&self, earlier: &StatsSummary) -> StatsSummary {
        StatsSummary {
            commands_opened: self.commands_opened.saturating_sub(earlier.commands_opened),
            queries: self.queries.saturating_sub(earlier.queries),
            non_queries: self.non_queries.saturating_sub(earlier.non_queries),
            failures: self.failures.saturating_sub(earlier.failures),
        }
    }
}
