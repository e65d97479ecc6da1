pub mod config;
pub mod error;
pub mod hang;
pub mod job;
pub mod process;
pub mod pruner;
pub mod server;
pub mod table;
pub mod terminate;

pub use config::AgentConfig;
pub use server::{build_router, AppState};
