//! Server state

use crate::deploy::orchestrator::Orchestrator;

/// Shared by every request handler
pub struct ServerState {
    pub orchestrator: Orchestrator,
}

impl ServerState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}
