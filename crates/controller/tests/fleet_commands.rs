//! End-to-end tests driving the controller's fan-out against real bound
//! mock agents (tiny axum servers), covering the seed scenarios in
//! `spec.md` §8 that involve an unreachable or slow client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use carla_wire::{ClientEntry, ProcInfo, ProcStatus, StartResponse};

use carla_controller::commands::{self, start};
use carla_controller::poll::poll_until_done;

/// Start a mock agent that always reports `job_id` as exited with
/// `returncode`, on an ephemeral port. Returns the bound address.
async fn spawn_exited_agent(job_id: &'static str, returncode: i32) -> SocketAddr {
    let info = ProcInfo {
        job_id: job_id.to_string(),
        pid: 4242,
        status: ProcStatus::Exited,
        returncode: Some(returncode),
        start_time_utc: "2026-01-01T00:00:00Z".into(),
        uptime_sec: 1.0,
        cpu_percent: 0.0,
        mem_mb: 0.0,
        last_cpu_active_utc: "2026-01-01T00:00:00Z".into(),
        is_hung: false,
        cmdline: vec!["true".into()],
        cwd: None,
        stdout_log: None,
        stderr_log: None,
    };
    let router = Router::new().route(
        "/status",
        get(move || {
            let info = info.clone();
            async move { Json(vec![info]) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A mock agent whose `/status` never resolves the target job, to exercise
/// the controller-side poll timeout path.
async fn spawn_forever_running_agent() -> SocketAddr {
    let call_count = Arc::new(AtomicUsize::new(0));
    let router = Router::new().route(
        "/status",
        get(move |State(_): State<()>| {
            let call_count = call_count.clone();
            async move {
                call_count.fetch_add(1, Ordering::SeqCst);
                Json(vec![ProcInfo {
                    job_id: "busy".into(),
                    pid: 1,
                    status: ProcStatus::Running,
                    returncode: None,
                    start_time_utc: "2026-01-01T00:00:00Z".into(),
                    uptime_sec: 1.0,
                    cpu_percent: 50.0,
                    mem_mb: 10.0,
                    last_cpu_active_utc: "2026-01-01T00:00:00Z".into(),
                    is_hung: false,
                    cmdline: vec!["sleep".into()],
                    cwd: None,
                    stdout_log: None,
                    stderr_log: None,
                }])
            }
        }),
    )
    .with_state(());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A mock agent that accepts `/start` and then immediately reports the job
/// as exited with `returncode`, for exercising `start::run`'s own fan-out
/// (as opposed to driving `poll_until_done` directly).
async fn spawn_start_and_exit_agent(job_id: &'static str, returncode: i32) -> SocketAddr {
    let info = ProcInfo {
        job_id: job_id.to_string(),
        pid: 4242,
        status: ProcStatus::Exited,
        returncode: Some(returncode),
        start_time_utc: "2026-01-01T00:00:00Z".into(),
        uptime_sec: 1.0,
        cpu_percent: 0.0,
        mem_mb: 0.0,
        last_cpu_active_utc: "2026-01-01T00:00:00Z".into(),
        is_hung: false,
        cmdline: vec!["true".into()],
        cwd: None,
        stdout_log: None,
        stderr_log: None,
    };
    let router = Router::new()
        .route(
            "/start",
            post(move || async move {
                Json(StartResponse { job_id: job_id.to_string(), pid: 4242, stdout_log: None, stderr_log: None })
            }),
        )
        .route(
            "/status",
            get(move || {
                let info = info.clone();
                async move { Json(vec![info]) }
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_entry(name: &str, addr: SocketAddr) -> ClientEntry {
    ClientEntry { name: name.into(), host: addr.ip().to_string(), port: addr.port() }
}

#[tokio::test]
async fn exited_client_resolves_immediately_with_its_returncode() {
    let addr = spawn_exited_agent("job-1", 0).await;
    let clients = vec![client_entry("a", addr)];
    let results = poll_until_done("secret", "job-1", clients, std::time::Duration::from_secs(5)).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].returncode, Some(0));
}

#[tokio::test]
async fn unreachable_client_never_resolves_and_times_out() {
    // Nothing is listening on this port.
    let unreachable = client_entry("offline", "127.0.0.1:1".parse().unwrap());
    let results = poll_until_done("secret", "job-1", vec![unreachable], std::time::Duration::from_millis(500)).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].returncode, None);
}

#[tokio::test]
async fn mixed_fleet_reports_success_for_reachable_and_timeout_for_offline() {
    let addr = spawn_exited_agent("job-x", 0).await;
    let offline = client_entry("b", "127.0.0.1:1".parse().unwrap());
    let clients = vec![client_entry("a", addr), offline];

    let results = poll_until_done("secret", "job-x", clients, std::time::Duration::from_millis(800)).await;
    assert_eq!(results.len(), 2);
    let a = results.iter().find(|r| r.client.name == "a").unwrap();
    let b = results.iter().find(|r| r.client.name == "b").unwrap();
    assert_eq!(a.returncode, Some(0));
    assert_eq!(b.returncode, None);
}

#[tokio::test]
async fn still_running_job_is_not_resolved_before_the_deadline() {
    let addr = spawn_forever_running_agent().await;
    let clients = vec![client_entry("a", addr)];
    let results = poll_until_done("secret", "busy", clients, std::time::Duration::from_millis(300)).await;
    assert_eq!(results[0].returncode, None);
}

/// Seed scenario (`spec.md` §8 #4): `exec --clients a,b` where `b` is
/// offline and `a` runs a fast no-op — overall verdict must be failure even
/// though the one client that *did* start exited 0.
#[tokio::test]
async fn a_client_that_fails_to_start_fails_the_overall_verdict() {
    let addr = spawn_start_and_exit_agent("job-ok", 0).await;
    let online = client_entry("a", addr);
    let offline = client_entry("b", "127.0.0.1:1".parse().unwrap());

    let args = start::StartArgs {
        exe: "true".into(),
        args: Vec::new(),
        cwd: None,
        log_dir: None,
        job_id: Some("job-ok".into()),
        kill_existing: true,
        wait: true,
        timeout: std::time::Duration::from_millis(800),
    };
    let (_, results) = start::run("secret", vec![online, offline], args).await;

    assert_eq!(results.len(), 2, "the offline client must still appear in the verdict, not vanish");
    let b = results.iter().find(|r| r.client.name == "b").unwrap();
    assert_eq!(b.returncode, None);
    assert_eq!(commands::aggregate_exit_code(&results), 1);
}
