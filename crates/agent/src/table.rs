//! The agent's job table: `job_id -> Job`, guarded by a single mutex that is
//! never held across a sample or terminate call, per `spec.md` §4.1
//! "Concurrency".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::job::Job;

/// Exited jobs are retained for this long so a late `status`/`stop` poll
/// still finds them, then pruned to bound memory.
pub const RETENTION_AFTER_EXIT: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
pub struct JobTable {
    jobs: Mutex<HashMap<String, Arc<Job>>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly spawned job. Returns `false` without inserting if
    /// `job_id` already exists (duplicate job_id, `spec.md` §6.2).
    pub fn insert(&self, job: Job) -> bool {
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&job.job_id) {
            return false;
        }
        jobs.insert(job.job_id.clone(), Arc::new(job));
        true
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs.lock().get(job_id).cloned()
    }

    pub fn remove(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs.lock().remove(job_id)
    }

    /// A point-in-time snapshot of every tracked job, for `/stop_all` and
    /// the pruner. Taken with the table lock held only long enough to clone
    /// the `Arc`s, never while touching a per-job mutex.
    pub fn snapshot(&self) -> Vec<Arc<Job>> {
        self.jobs.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Remove jobs that exited more than `RETENTION_AFTER_EXIT` ago, per
    /// `Job::expired_since_exit`.
    pub fn prune_exited_before(&self, now: Instant, is_expired: impl Fn(&Job, Instant) -> bool) {
        let mut jobs = self.jobs.lock();
        jobs.retain(|_, job| !is_expired(job, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use std::process::Stdio;

    async fn spawn_sleep(job_id: &str) -> Job {
        let mut cmd = tokio::process::Command::new("sleep");
        cmd.arg("30").stdout(Stdio::null()).stderr(Stdio::null());
        let child = cmd.spawn().expect("spawn sleep");
        let pid = child.id().expect("pid");
        Job::new(job_id.to_string(), pid, vec!["sleep".into(), "30".into()], None, None, None, child)
    }

    #[tokio::test]
    async fn duplicate_job_id_is_rejected() {
        let table = JobTable::new();
        assert!(table.insert(spawn_sleep("a").await));
        assert!(!table.insert(spawn_sleep("a").await));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn get_and_remove_round_trip() {
        let table = JobTable::new();
        table.insert(spawn_sleep("a").await);
        assert!(table.get("a").is_some());
        assert!(table.get("missing").is_none());
        let removed = table.remove("a");
        assert!(removed.is_some());
        assert!(table.get("a").is_none());
    }

    #[tokio::test]
    async fn snapshot_reflects_current_contents() {
        let table = JobTable::new();
        table.insert(spawn_sleep("a").await);
        table.insert(spawn_sleep("b").await);
        assert_eq!(table.snapshot().len(), 2);
    }
}
