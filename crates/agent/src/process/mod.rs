//! Platform process primitives: spawn-flag application, CPU/memory
//! sampling, liveness checks, process-table enumeration, and termination.
//!
//! `spec.md` targets Windows workstations exclusively; the `cfg(unix)` path
//! provides the same semantics via `/proc` and POSIX signals so the crate
//! builds and its test suite is meaningful off-Windows too, mirroring the
//! teacher's own `cfg(windows)`/`cfg(unix)` split in its kill path.

pub mod family;

pub use family::{find_process_family, ProcessSnapshotEntry, SIMULATOR_NAME_PATTERNS};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::*;

#[cfg(not(any(unix, windows)))]
compile_error!("carla-agent requires a unix or windows target");

/// A single CPU%/memory sample over a short measurement window.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sample {
    pub cpu_percent: f64,
    pub mem_mb: f64,
}

/// How long to measure CPU activity over for one sample, per `spec.md`
/// §4.1 ("a short (≈100 ms) measurement window").
pub const SAMPLE_WINDOW: std::time::Duration = std::time::Duration::from_millis(100);
