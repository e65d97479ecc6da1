//! `exec`/`start --wait` polling loop, per `spec.md` §4.2 "Polling loop".

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use carla_wire::{ClientEntry, ProcInfo};

use crate::fanout::{self, ClientOutcome};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PollResult {
    pub client: ClientEntry,
    /// `None` means the client never resolved before the deadline.
    pub returncode: Option<i32>,
}

async fn fetch_status(
    token: String,
    clients: Vec<ClientEntry>,
) -> Vec<ClientOutcome<Vec<ProcInfo>>> {
    fanout::dispatch(clients, move |http, client| {
        let token = token.clone();
        async move {
            let url = format!("{}/status", client.base_url());
            let resp = http
                .get(url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                return Err(format!("HTTP {}", resp.status()));
            }
            resp.json::<Vec<ProcInfo>>().await.map_err(|e| e.to_string())
        }
    })
    .await
}

/// Poll every client's `/status` until `job_id` reaches a terminal state
/// (or is absent, treated as already-exited success) on all of them, or
/// `deadline` elapses. Prints a line per client as it resolves.
pub async fn poll_until_done(
    token: &str,
    job_id: &str,
    mut pending: Vec<ClientEntry>,
    deadline: Duration,
) -> Vec<PollResult> {
    let start = Instant::now();
    let mut done: HashMap<String, PollResult> = HashMap::new();

    loop {
        if pending.is_empty() || start.elapsed() >= deadline {
            break;
        }

        let outcomes = fetch_status(token.to_string(), pending.clone()).await;
        let mut still_pending = Vec::new();

        for outcome in outcomes {
            let client = outcome.client;
            match outcome.result {
                Err(err) => {
                    eprintln!("{}: {err}", client.name);
                    still_pending.push(client);
                }
                Ok(infos) => match infos.into_iter().find(|i| i.job_id == job_id) {
                    Some(info) if info.status.is_terminal() => {
                        let code = info.returncode.unwrap_or(0);
                        println!("{}: {} (exit {code})", client.name, info.status.as_str());
                        done.insert(client.name.clone(), PollResult { client, returncode: Some(code) });
                    }
                    Some(_) => still_pending.push(client),
                    None => {
                        println!("{}: job not tracked; assuming fast exit with code 0", client.name);
                        done.insert(client.name.clone(), PollResult { client, returncode: Some(0) });
                    }
                },
            }
        }

        pending = still_pending;
        if pending.is_empty() || start.elapsed() >= deadline {
            break;
        }
        debug!(job_id, remaining = pending.len(), "still polling");
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    for client in pending {
        println!("{}: TIMEOUT", client.name);
        done.insert(client.name.clone(), PollResult { client, returncode: None });
    }

    done.into_values().collect()
}
