//! `controller start`, per `spec.md` §4.2 and §6.4.

use carla_wire::{ClientEntry, StartRequest, StartResponse};

use crate::fanout;
use crate::jobid::derive_job_id;
use crate::poll::{poll_until_done, PollResult};

pub struct StartArgs {
    pub exe: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub log_dir: Option<String>,
    pub job_id: Option<String>,
    pub kill_existing: bool,
    pub wait: bool,
    pub timeout: std::time::Duration,
}

/// Fire `/start` at every client in parallel; optionally poll to
/// completion. Returns the resolved job id plus, when `wait` was set, the
/// per-client poll results (empty otherwise — `start` without `--wait` is
/// fire-and-forget).
pub async fn run(
    token: &str,
    clients: Vec<ClientEntry>,
    args: StartArgs,
) -> (String, Vec<PollResult>) {
    let mut cmd = vec![args.exe.clone()];
    cmd.extend(args.args.iter().cloned());
    let job_id = args.job_id.clone().unwrap_or_else(|| derive_job_id(&cmd));

    let request = StartRequest {
        job_id: Some(job_id.clone()),
        cmd,
        cwd: args.cwd.clone(),
        env: None,
        log_dir: args.log_dir.clone(),
        kill_existing: args.kill_existing,
    };

    let token_owned = token.to_string();
    let outcomes = fanout::dispatch(clients.clone(), move |http, client| {
        let token = token_owned.clone();
        let request = request.clone();
        async move {
            let url = format!("{}/start", client.base_url());
            let resp = http
                .post(url)
                .bearer_auth(&token)
                .json(&request)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(format!("HTTP {status}: {body}"));
            }
            resp.json::<StartResponse>().await.map_err(|e| e.to_string())
        }
    })
    .await;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(resp) => println!("{}: started job {} (pid {})", outcome.client.name, resp.job_id, resp.pid),
            Err(err) => eprintln!("{}: {err}", outcome.client.name),
        }
    }

    if !args.wait {
        return (job_id, Vec::new());
    }

    let mut succeeded = Vec::new();
    // A client whose `/start` call itself failed (e.g. the agent is
    // unreachable) never gets a job to poll for; record it as an
    // unresolved failure up front so it still counts against the verdict
    // instead of silently vanishing from `results`.
    let mut results: Vec<PollResult> = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(_) => succeeded.push(outcome.client),
            Err(_) => results.push(PollResult { client: outcome.client, returncode: None }),
        }
    }

    results.extend(poll_until_done(token, &job_id, succeeded, args.timeout).await);
    (job_id, results)
}
