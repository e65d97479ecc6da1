use std::time::Duration;

use clap::{Parser, Subcommand};

use carla_controller::argsplit;
use carla_controller::commands::{self, exec, start, status, stop};
use carla_wire::{Inventory, TerminateMode};

/// CARLA fleet controller: fans requests out to agents listed in an
/// inventory file and aggregates their results.
#[derive(Debug, Parser)]
#[command(name = "carla-controller")]
struct Cli {
    /// Path to the fleet inventory YAML file.
    #[arg(long)]
    inventory: String,

    /// Comma-separated subset of inventory client names to target.
    #[arg(long)]
    clients: Option<String>,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fire-and-forget: start a command on every selected client.
    Start {
        #[arg(long)]
        exe: String,
        #[arg(long)]
        cwd: Option<String>,
        #[arg(long = "log-dir")]
        log_dir: Option<String>,
        #[arg(long = "job-id")]
        job_id: Option<String>,
        /// Poll until completion instead of returning immediately.
        #[arg(long)]
        wait: bool,
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Tree-kill (by default) every job on every selected client.
    Stop {
        #[arg(long, default_value = "tree_kill")]
        mode: String,
    },
    /// Render each selected client's job table as a table.
    Status,
    /// Start with kill_existing, wait for completion, aggregate exit codes.
    Exec {
        #[arg(long)]
        exe: String,
        #[arg(long)]
        cwd: Option<String>,
        #[arg(long = "log-dir")]
        log_dir: Option<String>,
        #[arg(long = "job-id")]
        job_id: Option<String>,
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let (parsed_args, passthrough_args) = argsplit::split_args(&raw_args);

    let cli = Cli::parse_from(std::iter::once("carla-controller".to_string()).chain(parsed_args));
    init_tracing(cli.verbose);

    let inventory = Inventory::load(&cli.inventory)?;
    let clients = inventory.filtered(cli.clients.as_deref());
    if clients.is_empty() {
        eprintln!("warning: no inventory clients matched the --clients filter; nothing to do");
        return Ok(());
    }

    let exit_code = match cli.command {
        Command::Start { exe, cwd, log_dir, job_id, wait, timeout } => {
            if !wait && timeout != 300 {
                eprintln!("warning: --timeout has no effect without --wait; ignoring");
            }
            let args = start::StartArgs {
                exe,
                args: passthrough_args,
                cwd,
                log_dir,
                job_id,
                kill_existing: true,
                wait,
                timeout: Duration::from_secs(timeout),
            };
            let (_, results) = start::run(&inventory.token, clients, args).await;
            if wait { commands::aggregate_exit_code(&results) } else { 0 }
        }
        Command::Stop { mode } => {
            let mode: TerminateMode = mode.parse().map_err(anyhow::Error::msg)?;
            stop::run(&inventory.token, clients, mode).await;
            0
        }
        Command::Status => {
            status::run(&inventory.token, clients).await;
            0
        }
        Command::Exec { exe, cwd, log_dir, job_id, timeout } => {
            let args = exec::ExecArgs {
                exe,
                args: passthrough_args,
                cwd,
                log_dir,
                job_id,
                timeout: Duration::from_secs(timeout),
            };
            let outcome = exec::run(&inventory.token, clients, args).await;
            outcome.exit_code
        }
    };

    std::process::exit(exit_code);
}
