//! Deployment workflows

pub mod fsm;
pub mod orchestrator;
pub mod poll;

pub use orchestrator::{InspectDetail, Orchestrator, OrchestratorOptions, Progress};
