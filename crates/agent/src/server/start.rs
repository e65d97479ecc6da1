//! `POST /start`, per `spec.md` §4.1 "Spawn" and §6.1.

use std::process::Stdio;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use carla_wire::{generate_job_id, StartRequest, StartResponse, TerminateMode};

use crate::error::AgentError;
use crate::job::{Job, LogHandles, LogPaths};
use crate::process;

use super::AppState;

pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, AgentError> {
    if req.cmd.is_empty() {
        return Err(AgentError::EmptyCommand);
    }

    let job_id = req.job_id.clone().unwrap_or_else(generate_job_id);

    if let Some(existing) = state.table.get(&job_id) {
        if req.kill_existing {
            info!(job_id, "kill_existing set: tree-killing prior job before respawn");
            let old_pid = existing.pid;
            crate::terminate::terminate_job(&existing, TerminateMode::TreeKill).await;
            state.table.remove(&job_id);
            if !wait_for_pid_gone(old_pid, std::time::Duration::from_secs(15)).await {
                warn!(job_id, pid = old_pid, "old pid survived kill_existing termination; proceeding anyway");
            }
        } else {
            return Err(AgentError::DuplicateJob(job_id));
        }
    }

    let (log_paths, log_handles, stdout_stdio, stderr_stdio) = match &req.log_dir {
        Some(dir) => {
            let (paths, handles) = open_job_logs(dir, &job_id)
                .map_err(|e| AgentError::SpawnFailed(e.to_string()))?;
            let out = handles.stdout.try_clone().map_err(|e| AgentError::SpawnFailed(e.to_string()))?;
            let err = handles.stderr.try_clone().map_err(|e| AgentError::SpawnFailed(e.to_string()))?;
            (Some(paths), Some(handles), Stdio::from(out), Stdio::from(err))
        }
        None => (None, None, Stdio::null(), Stdio::null()),
    };

    let mut cmd = tokio::process::Command::new(&req.cmd[0]);
    cmd.args(&req.cmd[1..]);
    if let Some(cwd) = &req.cwd {
        cmd.current_dir(cwd);
    }
    if let Some(env) = &req.env {
        cmd.envs(env);
    }
    // Simulator tooling assumes UTF-8 stdio regardless of what the caller requested.
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd.stdin(Stdio::null()).stdout(stdout_stdio).stderr(stderr_stdio);
    process::apply_spawn_flags(&mut cmd);

    let child = cmd
        .spawn()
        .map_err(|e| AgentError::SpawnFailed(format!("{}: {e}", req.cmd[0])))?;
    let pid = child
        .id()
        .ok_or_else(|| AgentError::SpawnFailed("process exited before pid was available".into()))?;

    let response = StartResponse {
        job_id: job_id.clone(),
        pid,
        stdout_log: log_paths.as_ref().map(|p| p.stdout.clone()),
        stderr_log: log_paths.as_ref().map(|p| p.stderr.clone()),
    };

    let job = Job::new(job_id.clone(), pid, req.cmd.clone(), req.cwd.clone(), log_paths, log_handles, child);
    if !state.table.insert(job) {
        // Lost a race against a concurrent /start with the same job_id;
        // the process we just spawned is orphaned, best-effort kill it.
        process::terminate_hard(&[pid]);
        return Err(AgentError::DuplicateJob(job_id));
    }

    info!(job_id, pid, cmd = ?req.cmd, "job started");
    Ok(Json(response))
}

async fn wait_for_pid_gone(pid: u32, timeout: std::time::Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if !process::process_exists(pid) {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

fn open_job_logs(dir: &str, job_id: &str) -> std::io::Result<(LogPaths, LogHandles)> {
    std::fs::create_dir_all(dir)?;
    let stdout_path = format!("{dir}/{job_id}.out.log");
    let stderr_path = format!("{dir}/{job_id}.err.log");
    let stdout = std::fs::OpenOptions::new().create(true).append(true).open(&stdout_path)?;
    let stderr = std::fs::OpenOptions::new().create(true).append(true).open(&stderr_path)?;
    Ok((
        LogPaths { stdout: stdout_path, stderr: stderr_path },
        LogHandles { stdout, stderr },
    ))
}
