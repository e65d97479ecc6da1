//! Wire types shared by the agent and controller: request/response shapes
//! for start/stop/status, the fleet inventory format, and job-id generation.

pub mod id;
pub mod inventory;
pub mod types;

pub use id::generate_job_id;
pub use inventory::{ClientEntry, Inventory};
pub use types::{
    HealthResponse, ProcInfo, ProcStatus, StartRequest, StartResponse, StopAllResponse,
    StopRequest, StopResponse, TerminateMode,
};
