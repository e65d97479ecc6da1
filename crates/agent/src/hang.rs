//! Hang detection: a sliding CPU-activity window per job, per `spec.md`
//! §4.1. Pure logic, unit-testable without touching the OS.

use std::time::Instant;

/// Apply one fresh CPU% sample to a job's activity window.
///
/// Returns the (possibly updated) `last_cpu_active` instant and whether the
/// job is now considered hung. Any single sample above `threshold_pct`
/// resets the window — this is inactivity-based, not a rolling average.
pub fn observe_sample(
    last_cpu_active: Instant,
    now: Instant,
    cpu_percent: f64,
    threshold_pct: f64,
    hung_secs: f64,
) -> (Instant, bool) {
    let last_cpu_active = if cpu_percent > threshold_pct {
        now
    } else {
        last_cpu_active
    };
    let hung_elapsed = now.saturating_duration_since(last_cpu_active).as_secs_f64();
    let is_hung = hung_elapsed >= hung_secs;
    (last_cpu_active, is_hung)
}
