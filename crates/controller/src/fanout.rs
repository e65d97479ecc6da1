//! Generic fan-out primitive shared by the controller's three HTTP verbs
//! (`start` POST-json, `stop`/`stop_all` POST-empty, `status` GET), per
//! `spec.md` §9 "Polymorphism over capabilities".

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::debug;

use carla_wire::ClientEntry;

/// Per-request connect+read timeout, per `spec.md` §4.2.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on concurrent in-flight requests, per `spec.md` §4.2.
pub const MAX_WORKERS: usize = 32;

pub fn worker_pool_size(client_count: usize) -> usize {
    MAX_WORKERS.min(client_count).max(1)
}

/// One client's outcome from a fan-out call: either the decoded payload or
/// a human-readable transport/HTTP error, paired with the originating
/// client so callers don't need a side table to re-associate results.
pub struct ClientOutcome<T> {
    pub client: ClientEntry,
    pub result: Result<T, String>,
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client with a fixed timeout always builds")
}

/// Dispatch `call` against every client concurrently, bounded to
/// `worker_pool_size(clients.len())` requests in flight. A failing call
/// never aborts the others — each client's outcome is independent.
/// Results complete in arrival order, not input order.
pub async fn dispatch<T, F, Fut>(clients: Vec<ClientEntry>, call: F) -> Vec<ClientOutcome<T>>
where
    F: Fn(reqwest::Client, ClientEntry) -> Fut,
    Fut: std::future::Future<Output = Result<T, String>>,
{
    if clients.is_empty() {
        return Vec::new();
    }
    let http = http_client();
    let pool = worker_pool_size(clients.len());
    debug!(clients = clients.len(), workers = pool, "fanning out request");

    stream::iter(clients)
        .map(|client| {
            let http = http.clone();
            let call = &call;
            async move {
                let result = call(http, client.clone()).await;
                ClientOutcome { client, result }
            }
        })
        .buffer_unordered(pool)
        .collect()
        .await
}
