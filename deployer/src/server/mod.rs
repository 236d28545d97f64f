//! REST facade over the orchestrator

pub mod error;
pub mod handlers;
pub mod serve;
pub mod state;
