//! Three-tier termination escalation, per `spec.md` §4.1 "Termination":
//! soft signal, then (if still alive after a grace period) a hard kill,
//! optionally widened to the job's whole discovered process family.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use carla_wire::TerminateMode;

use crate::job::Job;
use crate::process::{self, SIMULATOR_NAME_PATTERNS};

/// How long to wait after a soft signal before escalating to a hard kill.
pub const SOFT_GRACE: Duration = Duration::from_secs(5);
/// How long to wait after a hard kill before giving up on a pid.
pub const HARD_GRACE: Duration = Duration::from_secs(5);

/// Window around job start used to catch escaped sibling processes by name
/// and timing, per `spec.md` §4.1 step 3 and §9 "Process-family discovery".
const FAMILY_WINDOW_BEFORE: Duration = Duration::from_secs(5);
const FAMILY_WINDOW_AFTER: Duration = Duration::from_secs(60);

/// Terminate `job` at the requested escalation tier. Every tier operates on
/// the job's full discovered process family (direct child, descendants, and
/// timing-correlated simulator siblings) rather than just the root pid, so
/// an escaped `CarlaUE4` process in its own process group is still reached
/// under `term`/`kill`, not only `tree_kill`. Always releases the job's log
/// handles before returning, regardless of whether the process actually
/// exited in time.
pub async fn terminate_job(job: &Job, mode: TerminateMode) {
    let root_pid = job.pid;
    let snapshot = process::enumerate_processes();
    let family = process::find_process_family(
        root_pid,
        job.start_instant,
        SIMULATOR_NAME_PATTERNS,
        FAMILY_WINDOW_BEFORE,
        FAMILY_WINDOW_AFTER,
        &snapshot,
    );
    let pids: Vec<u32> = family.into_iter().collect();

    match mode {
        TerminateMode::Term => {
            info!(job_id = %job.job_id, pids = ?pids, "term: soft-terminating discovered process family");
            process::terminate_soft(&pids);
            wait_for_root_exit(job, SOFT_GRACE).await;
        }
        TerminateMode::Kill | TerminateMode::TreeKill => {
            info!(job_id = %job.job_id, pids = ?pids, mode = mode.as_str(), "soft-terminating discovered process family");
            process::terminate_soft(&pids);
            wait_for_root_exit(job, SOFT_GRACE).await;
            tokio::time::sleep(SOFT_GRACE).await;

            let survivors: Vec<u32> =
                pids.iter().copied().filter(|&pid| process::process_exists(pid)).collect();
            if !survivors.is_empty() {
                warn!(job_id = %job.job_id, survivors = ?survivors, mode = mode.as_str(), "hard-killing survivors");
                process::terminate_hard(&survivors);
                tokio::time::sleep(HARD_GRACE).await;
                let still_alive: Vec<u32> =
                    survivors.iter().copied().filter(|&pid| process::process_exists(pid)).collect();
                if !still_alive.is_empty() {
                    warn!(job_id = %job.job_id, pids = ?still_alive, "process survived hard kill");
                }
            }
        }
    }

    job.lock().close_logs();
}

/// Poll the job's own child handle (not a raw pid check) so the exit is
/// actually reaped and `exit_code`/`exited_at` get recorded.
async fn wait_for_root_exit(job: &Job, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if job.lock().status().is_terminal() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
