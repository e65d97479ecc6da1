//! `controller status`, per `spec.md` §4.2: GET `/status` from every
//! selected client in parallel, render a fixed-column table sorted by
//! client name.

use carla_wire::{ClientEntry, ProcInfo};

use crate::fanout;

pub async fn run(token: &str, clients: Vec<ClientEntry>) {
    let token_owned = token.to_string();
    let mut outcomes = fanout::dispatch(clients, move |http, client| {
        let token = token_owned.clone();
        async move {
            let url = format!("{}/status", client.base_url());
            let resp = http.get(url).bearer_auth(&token).send().await.map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                return Err(format!("HTTP {}", resp.status()));
            }
            resp.json::<Vec<ProcInfo>>().await.map_err(|e| e.to_string())
        }
    })
    .await;

    outcomes.sort_by(|a, b| a.client.name.cmp(&b.client.name));

    println!(
        "{:<16} {:<38} {:>8} {:<9} {:>10} {:>10} {:<7}",
        "CLIENT", "JOB_ID", "PID", "STATUS", "CPU%", "MEM_MB", "HUNG"
    );
    for outcome in outcomes {
        match outcome.result {
            Err(err) => println!("{:<16} error: {err}", outcome.client.name),
            Ok(infos) if infos.is_empty() => {
                println!("{:<16} (no jobs)", outcome.client.name);
            }
            Ok(infos) => {
                for info in infos {
                    println!(
                        "{:<16} {:<38} {:>8} {:<9} {:>10.1} {:>10.1} {:<7}",
                        outcome.client.name,
                        info.job_id,
                        info.pid,
                        info.status.as_str(),
                        info.cpu_percent,
                        info.mem_mb,
                        info.is_hung,
                    );
                }
            }
        }
    }
}
