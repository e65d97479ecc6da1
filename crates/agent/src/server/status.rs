//! `GET /status` and `GET /status/:job_id`, per `spec.md` §6.1 and §4.1
//! "Sampling" — each call freshly samples CPU%/memory rather than serving
//! stale cached numbers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use carla_wire::ProcInfo;

use crate::error::AgentError;
use crate::hang;
use crate::job::Job;
use crate::process;

use super::AppState;

pub async fn status_one(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ProcInfo>, AgentError> {
    let job = state.table.get(&job_id).ok_or_else(|| AgentError::JobNotFound(job_id.clone()))?;
    Ok(Json(sample_proc_info(&state, &job).await))
}

pub async fn status_all(State(state): State<Arc<AppState>>) -> Json<Vec<ProcInfo>> {
    let jobs = state.table.snapshot();
    let mut infos = Vec::with_capacity(jobs.len());
    for job in &jobs {
        infos.push(sample_proc_info(&state, job).await);
    }
    Json(infos)
}

async fn sample_proc_info(state: &AppState, job: &Job) -> ProcInfo {
    let status = job.lock().status();

    if status.is_terminal() {
        let inner = job.lock();
        return ProcInfo {
            job_id: job.job_id.clone(),
            pid: job.pid,
            status,
            returncode: inner.exit_code,
            start_time_utc: job.start_utc.to_rfc3339(),
            uptime_sec: job.uptime_sec(),
            cpu_percent: 0.0,
            mem_mb: 0.0,
            last_cpu_active_utc: job.instant_to_utc(inner.last_cpu_active_instant).to_rfc3339(),
            is_hung: true,
            cmdline: job.cmdline.clone(),
            cwd: job.cwd.clone(),
            stdout_log: job.log_paths.as_ref().map(|p| p.stdout.clone()),
            stderr_log: job.log_paths.as_ref().map(|p| p.stderr.clone()),
        };
    }

    let sampled = process::sample(job.pid).await.unwrap_or_default();
    let now = std::time::Instant::now();

    let (last_active, is_hung) = {
        let inner = job.lock();
        hang::observe_sample(
            inner.last_cpu_active_instant,
            now,
            sampled.cpu_percent,
            state.config.hung_cpu_pct,
            state.config.hung_secs,
        )
    };

    let mut inner = job.lock();
    inner.last_cpu_active_instant = last_active;
    inner.cpu_percent = sampled.cpu_percent;
    inner.mem_mb = sampled.mem_mb;

    ProcInfo {
        job_id: job.job_id.clone(),
        pid: job.pid,
        status,
        returncode: inner.exit_code,
        start_time_utc: job.start_utc.to_rfc3339(),
        uptime_sec: job.uptime_sec(),
        cpu_percent: sampled.cpu_percent,
        mem_mb: sampled.mem_mb,
        last_cpu_active_utc: job.instant_to_utc(last_active).to_rfc3339(),
        is_hung,
        cmdline: job.cmdline.clone(),
        cwd: job.cwd.clone(),
        stdout_log: job.log_paths.as_ref().map(|p| p.stdout.clone()),
        stderr_log: job.log_paths.as_ref().map(|p| p.stderr.clone()),
    }
}
