//! `controller exec`, per `spec.md` §4.2: `start` with `kill_existing=true`,
//! always waits, aggregates per-client exit codes into one verdict.

use carla_wire::ClientEntry;

use super::{aggregate_exit_code, start};
use crate::poll::PollResult;

pub struct ExecArgs {
    pub exe: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub log_dir: Option<String>,
    pub job_id: Option<String>,
    pub timeout: std::time::Duration,
}

pub struct ExecOutcome {
    pub job_id: String,
    pub results: Vec<PollResult>,
    pub exit_code: i32,
}

pub async fn run(token: &str, clients: Vec<ClientEntry>, args: ExecArgs) -> ExecOutcome {
    let start_args = start::StartArgs {
        exe: args.exe,
        args: args.args,
        cwd: args.cwd,
        log_dir: args.log_dir,
        job_id: args.job_id,
        kill_existing: true,
        wait: true,
        timeout: args.timeout,
    };

    let (job_id, results) = start::run(token, clients, start_args).await;
    let exit_code = aggregate_exit_code(&results);

    for result in &results {
        match result.returncode {
            Some(0) => println!("{}: SUCCESS", result.client.name),
            Some(code) => println!("{}: FAILED (exit {code})", result.client.name),
            None => println!("{}: TIMEOUT", result.client.name),
        }
    }

    ExecOutcome { job_id, results, exit_code }
}
