//! Counters the agent loop logs periodically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

/// Event-kind tags used consistently across the flows so operators can grep
/// logs by subsystem.
pub const KIND_RACE: &str = "race";
pub const KIND_SKILLS: &str = "skills";
pub const KIND_PLANNED_RACE: &str = "planned_race";
pub const KIND_EVENT: &str = "event";
pub const KIND_CLASSIFIER: &str = "classifier";
pub const KIND_WAITER: &str = "waiter";

#[derive(Debug, Default, Serialize, Clone)]
pub struct MetricsSnapshot {
    pub relaxed_classification_fallbacks: u64,
    pub skipped_planned_race_hits: u64,
    pub soft_fail_counts: HashMap<String, u64>,
}

/// Process-wide counters. `AtomicU64` for the two scalar counts; a
/// mutex-guarded map for soft-fail reasons since `SoftFailReason` carries a
/// string payload and isn't a fixed small set of variants to size an array
/// by.
#[derive(Default)]
pub struct Metrics {
    relaxed_classification_fallbacks: AtomicU64,
    skipped_planned_race_hits: AtomicU64,
    soft_fail_counts: Mutex<HashMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_relaxed_classification_fallback(&self) {
        self.relaxed_classification_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_planned_race_hit(&self) {
        self.skipped_planned_race_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_soft_fail(&self, reason: &str) {
        let mut counts = self.soft_fail_counts.lock();
        *counts.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            relaxed_classification_fallbacks: self.relaxed_classification_fallbacks.load(Ordering::Relaxed),
            skipped_planned_race_hits: self.skipped_planned_race_hits.load(Ordering::Relaxed),
            soft_fail_counts: self.soft_fail_counts.lock().clone(),
        }
    }

    /// Log the current snapshot at info level, for the loop's periodic
    /// report.
    pub fn log_snapshot(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            event_type = "metrics_snapshot",
            relaxed_classification_fallbacks = snapshot.relaxed_classification_fallbacks,
            skipped_planned_race_hits = snapshot.skipped_planned_race_hits,
            soft_fail_counts = ?snapshot.soft_fail_counts,
            "periodic metrics"
        );
    }
}
