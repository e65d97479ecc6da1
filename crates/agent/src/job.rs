//! The in-memory Job record, per `spec.md` §3.

use std::fs::File;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::process::Child;

use carla_wire::ProcStatus;

/// Filesystem paths for a job's stdout/stderr sinks.
#[derive(Debug, Clone)]
pub struct LogPaths {
    pub stdout: String,
    pub stderr: String,
}

/// Open append-mode log file handles, held by the agent only to keep them
/// valid for the lifetime of the job; released (dropped) on termination.
pub struct LogHandles {
    pub stdout: File,
    pub stderr: File,
}

/// Fields that change over the life of a job, guarded by one per-job mutex.
/// Per `spec.md` §4.1 "Concurrency": sampling holds only this mutex, never
/// the job-table mutex.
pub struct JobInner {
    pub child: Child,
    pub last_cpu_active_instant: Instant,
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub exit_code: Option<i32>,
    pub exited_at: Option<Instant>,
    pub log_handles: Option<LogHandles>,
}

pub struct Job {
    pub job_id: String,
    pub pid: u32,
    pub cmdline: Vec<String>,
    pub cwd: Option<String>,
    pub start_instant: Instant,
    pub start_utc: DateTime<Utc>,
    pub log_paths: Option<LogPaths>,
    inner: Mutex<JobInner>,
}

impl Job {
    pub fn new(
        job_id: String,
        pid: u32,
        cmdline: Vec<String>,
        cwd: Option<String>,
        log_paths: Option<LogPaths>,
        log_handles: Option<LogHandles>,
        child: Child,
    ) -> Self {
        let now = Instant::now();
        Job {
            job_id,
            pid,
            cmdline,
            cwd,
            start_instant: now,
            start_utc: Utc::now(),
            log_paths,
            inner: Mutex::new(JobInner {
                child,
                last_cpu_active_instant: now,
                cpu_percent: 0.0,
                mem_mb: 0.0,
                exit_code: None,
                exited_at: None,
                log_handles,
            }),
        }
    }

    /// Lock the mutable fields for sampling/termination. Never call this
    /// while holding the job-table lock.
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, JobInner> {
        self.inner.lock()
    }

    pub fn uptime_sec(&self) -> f64 {
        self.start_instant.elapsed().as_secs_f64()
    }

    /// UTC instant corresponding to a monotonic `Instant`, anchored to this
    /// job's spawn time. Both `Instant`s must have been taken after process
    /// start so the subtraction cannot underflow in practice; saturate to
    /// zero defensively rather than panicking on clock weirdness.
    pub fn instant_to_utc(&self, instant: Instant) -> DateTime<Utc> {
        let delta = instant
            .checked_duration_since(self.start_instant)
            .unwrap_or_default();
        self.start_utc + chrono::Duration::from_std(delta).unwrap_or_default()
    }

    /// Whether this job exited more than `retention` ago and can be pruned.
    /// Locks the job's own mutex; never call while holding the table lock.
    pub fn expired_since_exit(&self, now: Instant, retention: std::time::Duration) -> bool {
        match self.inner.lock().exited_at {
            Some(exited_at) => now.saturating_duration_since(exited_at) >= retention,
            None => false,
        }
    }
}

impl JobInner {
    /// Release log handles exactly once; a second call is a no-op because
    /// `Option::take` returns `None` once already taken.
    pub fn close_logs(&mut self) {
        self.log_handles.take();
    }

    pub fn status(&mut self) -> ProcStatus {
        match self.child.try_wait() {
            Ok(Some(exit)) => {
                if self.exit_code.is_none() {
                    self.exit_code = exit.code();
                    self.exited_at = Some(Instant::now());
                }
                ProcStatus::Exited
            }
            Ok(None) => ProcStatus::Running,
            Err(_) => ProcStatus::Unknown,
        }
    }
}
