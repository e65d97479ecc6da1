//! `controller stop`, per `spec.md` §4.2 and §6.4.

use carla_wire::{ClientEntry, StopAllResponse, TerminateMode};

use crate::fanout;

pub async fn run(token: &str, clients: Vec<ClientEntry>, mode: TerminateMode) {
    let token_owned = token.to_string();
    let outcomes = fanout::dispatch(clients, move |http, client| {
        let token = token_owned.clone();
        async move {
            let url = format!("{}/stop_all?mode={}", client.base_url(), mode.as_str());
            let resp = http.post(url).bearer_auth(&token).send().await.map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                return Err(format!("HTTP {}", resp.status()));
            }
            resp.json::<StopAllResponse>().await.map_err(|e| e.to_string())
        }
    })
    .await;

    for outcome in outcomes {
        match outcome.result {
            Ok(resp) => println!("{}: {} (mode {})", outcome.client.name, resp.status, resp.mode.as_str()),
            Err(err) => eprintln!("{}: {err}", outcome.client.name),
        }
    }
}
