//! Background sweep that drops exited jobs from the table once they have
//! outlived `table::RETENTION_AFTER_EXIT`, releasing their log handles.
//! Runs on the same cadence as metrics sampling, per `spec.md` §4.1.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::table::{JobTable, RETENTION_AFTER_EXIT};

pub async fn run(table: Arc<JobTable>, interval: std::time::Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        sweep_once(&table);
    }
}

fn sweep_once(table: &JobTable) {
    let now = Instant::now();
    for job in table.snapshot() {
        job.lock().status();
    }
    table.prune_exited_before(now, |job, now| {
        let expired = job.expired_since_exit(now, RETENTION_AFTER_EXIT);
        if expired {
            job.lock().close_logs();
        }
        expired
    });
    debug!(jobs_remaining = table.len(), "pruner sweep complete");
}
