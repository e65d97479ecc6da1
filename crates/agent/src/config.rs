//! Agent-wide configuration, per `spec.md` §6.2 and §9 "Global mutable
//! state": read once at startup into an immutable record threaded through
//! the server construction, rather than read ad hoc from handlers.

use std::time::Duration;

/// The literal placeholder token that disables authentication (with a
/// startup warning), per `spec.md` §4.1.
pub const DEFAULT_TOKEN_PLACEHOLDER: &str = "change-me";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub token: String,
    pub metrics_interval: Duration,
    pub hung_cpu_pct: f64,
    pub hung_secs: f64,
    pub bind_addr: String,
}

impl AgentConfig {
    /// Build configuration from process environment variables, with a
    /// CLI-supplied bind address override.
    pub fn from_env(bind_addr: String) -> Self {
        let token = std::env::var("CARLA_AGENT_TOKEN")
            .unwrap_or_else(|_| DEFAULT_TOKEN_PLACEHOLDER.to_string());
        let metrics_interval = env_f64("CARLA_AGENT_METRICS_INTERVAL", 2.0);
        let hung_cpu_pct = env_f64("CARLA_AGENT_HUNG_CPU_PCT", 1.0);
        let hung_secs = env_f64("CARLA_AGENT_HUNG_SECS", 30.0);

        AgentConfig {
            token,
            metrics_interval: Duration::from_secs_f64(metrics_interval.max(0.0)),
            hung_cpu_pct,
            hung_secs,
            bind_addr,
        }
    }

    pub fn auth_disabled(&self) -> bool {
        self.token == DEFAULT_TOKEN_PLACEHOLDER
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
