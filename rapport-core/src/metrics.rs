//! Process counters for the relationship engine.
//!
//! Lock-free `AtomicU64` counters bumped on the interaction path and read on
//! export. Nothing here is persisted; counts restart with the process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters, one per tracked event.
#[derive(Debug)]
pub struct RapportCounters {
    /// Interactions fully processed and persisted.
    pub interactions_processed: AtomicU64,
    /// Episodes created.
    pub episodes_created: AtomicU64,
    /// Episodes dropped by the capacity bound.
    pub episodes_evicted: AtomicU64,
    /// Phase changes in either direction.
    pub phase_transitions: AtomicU64,
    /// Successful store writes.
    pub saves_completed: AtomicU64,
    /// Failed store writes.
    pub save_failures: AtomicU64,
    /// Records reset to defaults.
    pub records_reset: AtomicU64,
    /// Records deleted.
    pub records_deleted: AtomicU64,
}

impl RapportCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interactions_processed: AtomicU64::new(0),
            episodes_created: AtomicU64::new(0),
            episodes_evicted: AtomicU64::new(0),
            phase_transitions: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            records_reset: AtomicU64::new(0),
            records_deleted: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment `counter` by one.
    pub fn incr(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    /// Read every counter at once.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            interactions_processed: self.interactions_processed.load(Ordering::Relaxed),
            episodes_created: self.episodes_created.load(Ordering::Relaxed),
            episodes_evicted: self.episodes_evicted.load(Ordering::Relaxed),
            phase_transitions: self.phase_transitions.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            records_reset: self.records_reset.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
        }
    }
}

impl Default for RapportCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    /// Interactions processed.
    pub interactions_processed: u64,
    /// Episodes created.
    pub episodes_created: u64,
    /// Episodes evicted.
    pub episodes_evicted: u64,
    /// Phase transitions.
    pub phase_transitions: u64,
    /// Successful saves.
    pub saves_completed: u64,
    /// Failed saves.
    pub save_failures: u64,
    /// Records reset.
    pub records_reset: u64,
    /// Records deleted.
    pub records_deleted: u64,
}

impl CounterSnapshot {
    /// Render as Prometheus text exposition format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let series = [
            ("interactions_processed", "Interactions processed", self.interactions_processed),
            ("episodes_created", "Episodes created", self.episodes_created),
            ("episodes_evicted", "Episodes evicted by the capacity bound", self.episodes_evicted),
            ("phase_transitions", "Relationship phase transitions", self.phase_transitions),
            ("saves_completed", "Successful record saves", self.saves_completed),
            ("save_failures", "Failed record saves", self.save_failures),
            ("records_reset", "Records reset to defaults", self.records_reset),
            ("records_deleted", "Records deleted", self.records_deleted),
        ];

        let mut out = String::new();
        for (name, help, value) in series {
            out.push_str(&format!(
                "# HELP rapport_{name}_total {help}\n\
                 # TYPE rapport_{name}_total counter\n\
                 rapport_{name}_total {value}\n"
            ));
        }
        out
    }
}
