//! HTTP wire message shapes, per `spec.md` §6.1.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StartRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    pub cmd: Vec<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub kill_existing: bool,
}

/// Response of a successful `POST /start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartResponse {
    pub job_id: String,
    pub pid: u32,
    pub stdout_log: Option<String>,
    pub stderr_log: Option<String>,
}

/// Termination escalation mode, per `spec.md` §4.1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerminateMode {
    /// Soft terminate only.
    #[default]
    Term,
    /// Soft terminate, then hard kill survivors.
    Kill,
    /// Same as `Kill`, applied to the full discovered process family.
    TreeKill,
}

impl TerminateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminateMode::Term => "term",
            TerminateMode::Kill => "kill",
            TerminateMode::TreeKill => "tree_kill",
        }
    }
}

impl std::str::FromStr for TerminateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" => Ok(TerminateMode::Term),
            "kill" => Ok(TerminateMode::Kill),
            "tree_kill" => Ok(TerminateMode::TreeKill),
            other => Err(format!("unknown termination mode: {other}")),
        }
    }
}

/// Body of `POST /stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopRequest {
    pub job_id: String,
    #[serde(default)]
    pub mode: TerminateMode,
}

/// Response of `POST /stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopResponse {
    pub status: String,
    pub job_id: String,
    pub mode: TerminateMode,
}

/// Response of `POST /stop_all`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopAllResponse {
    pub status: String,
    pub mode: TerminateMode,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub time_utc: String,
    pub jobs: usize,
}

/// Lifecycle status of a supervised process, per `spec.md` §6.1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcStatus {
    Running,
    Exited,
    Unknown,
}

impl ProcStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcStatus::Exited | ProcStatus::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcStatus::Running => "running",
            ProcStatus::Exited => "exited",
            ProcStatus::Unknown => "unknown",
        }
    }
}

/// One entry of `GET /status`, per `spec.md` §6.1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcInfo {
    pub job_id: String,
    pub pid: u32,
    pub status: ProcStatus,
    pub returncode: Option<i32>,
    pub start_time_utc: String,
    pub uptime_sec: f64,
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub last_cpu_active_utc: String,
    pub is_hung: bool,
    pub cmdline: Vec<String>,
    pub cwd: Option<String>,
    pub stdout_log: Option<String>,
    pub stderr_log: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_round_trips_through_json() {
        let req = StartRequest {
            job_id: Some("abc".into()),
            cmd: vec!["cmd.exe".into(), "/c".into(), "exit".into(), "0".into()],
            cwd: None,
            env: None,
            log_dir: Some("C:/logs".into()),
            kill_existing: true,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: StartRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn stop_request_defaults_mode_to_term() {
        let json = r#"{"job_id":"abc"}"#;
        let req: StopRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.mode, TerminateMode::Term);
    }

    #[test]
    fn terminate_mode_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TerminateMode::TreeKill).unwrap(), "\"tree_kill\"");
        assert_eq!("tree_kill".parse::<TerminateMode>().unwrap(), TerminateMode::TreeKill);
        assert!("bogus".parse::<TerminateMode>().is_err());
    }

    #[test]
    fn proc_status_terminal_classification() {
        assert!(!ProcStatus::Running.is_terminal());
        assert!(ProcStatus::Exited.is_terminal());
        assert!(ProcStatus::Unknown.is_terminal());
    }
}
