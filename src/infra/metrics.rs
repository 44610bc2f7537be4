//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector for the detector loop
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps interval counters to get a
/// consistent-enough snapshot for logging.
pub struct Metrics {
    /// Total classification cycles ever committed (monotonic)
    cycles_total: AtomicU64,
    /// Cycles since last report (reset on report)
    cycles_since_report: AtomicU64,
    /// Frames the source failed to supply (monotonic)
    frame_misses: AtomicU64,
    /// Cycles skipped due to a classification error (monotonic)
    classify_errors: AtomicU64,
    /// Observed slot state flips (monotonic)
    transitions_total: AtomicU64,
    /// Entry advisories produced (monotonic)
    entry_advisories: AtomicU64,
    /// Exit advisories produced (monotonic)
    exit_advisories: AtomicU64,
    /// Sum of cycle latencies in microseconds (reset on report)
    cycle_latency_sum_us: AtomicU64,
    /// Max cycle latency in microseconds (reset on report)
    cycle_latency_max_us: AtomicU64,
    /// When collection started
    started_at: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_since_report: AtomicU64::new(0),
            frame_misses: AtomicU64::new(0),
            classify_errors: AtomicU64::new(0),
            transitions_total: AtomicU64::new(0),
            entry_advisories: AtomicU64::new(0),
            exit_advisories: AtomicU64::new(0),
            cycle_latency_sum_us: AtomicU64::new(0),
            cycle_latency_max_us: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_cycle(&self, latency_us: u64) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycles_since_report.fetch_add(1, Ordering::Relaxed);
        self.cycle_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.cycle_latency_max_us, latency_us);
    }

    pub fn record_frame_miss(&self) {
        self.frame_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classify_error(&self) {
        self.classify_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transitions(&self, count: u64) {
        self.transitions_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_entry_advisory(&self) {
        self.entry_advisories.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exit_advisory(&self) {
        self.exit_advisories.fetch_add(1, Ordering::Relaxed);
    }

    /// Build a summary, resetting the per-interval counters
    pub fn report(&self) -> MetricsSummary {
        let interval_cycles = self.cycles_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.cycle_latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.cycle_latency_max_us.swap(0, Ordering::Relaxed);
        let latency_avg = if interval_cycles > 0 { latency_sum / interval_cycles } else { 0 };

        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            interval_cycles,
            frame_misses: self.frame_misses.load(Ordering::Relaxed),
            classify_errors: self.classify_errors.load(Ordering::Relaxed),
            transitions_total: self.transitions_total.load(Ordering::Relaxed),
            entry_advisories: self.entry_advisories.load(Ordering::Relaxed),
            exit_advisories: self.exit_advisories.load(Ordering::Relaxed),
            cycle_latency_avg_us: latency_avg,
            cycle_latency_max_us: latency_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub cycles_total: u64,
    pub interval_cycles: u64,
    pub frame_misses: u64,
    pub classify_errors: u64,
    pub transitions_total: u64,
    pub entry_advisories: u64,
    pub exit_advisories: u64,
    pub cycle_latency_avg_us: u64,
    pub cycle_latency_max_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            cycles_total = %self.cycles_total,
            interval_cycles = %self.interval_cycles,
            frame_misses = %self.frame_misses,
            classify_errors = %self.classify_errors,
            transitions_total = %self.transitions_total,
            entry_advisories = %self.entry_advisories,
            exit_advisories = %self.exit_advisories,
            cycle_latency_avg_us = %self.cycle_latency_avg_us,
            cycle_latency_max_us = %self.cycle_latency_max_us,
            "metrics_summary"
        );
    }
}
