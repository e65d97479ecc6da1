use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use carla_agent::{build_router, AgentConfig, AppState};

/// CARLA fleet agent: spawns and supervises simulator processes on this
/// host and exposes their lifecycle over HTTP.
#[derive(Debug, Parser)]
struct Cli {
    /// Address to bind the HTTP server on.
    #[arg(long, default_value = "0.0.0.0:8081")]
    bind: String,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
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
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AgentConfig::from_env(cli.bind.clone());
    if config.auth_disabled() {
        warn!("CARLA_AGENT_TOKEN is unset; running with the default placeholder token, authentication is effectively disabled");
    }

    let table = Arc::new(carla_agent::table::JobTable::new());
    let state = Arc::new(AppState { table: table.clone(), config: config.clone() });

    tokio::spawn(carla_agent::pruner::run(table, config.metrics_interval));

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind = %config.bind_addr, "carla-agentd listening");
    axum::serve(listener, router).await?;

    Ok(())
}
