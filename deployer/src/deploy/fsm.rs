//! Finite State Machine for the create workflow

use serde::{Deserialize, Serialize};
use std::fmt;

/// Create workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateState {
    /// Checking user input, no network calls yet
    Validating,

    /// Confirming the provider token
    AuthChecking,

    /// Picking a node to host the instance
    NodeSelecting,

    /// Building config, profiles and the bootstrap artifact
    Configuring,

    /// Submitting the provision request
    Provisioning,

    /// Creating the instance from the provision result
    Activating,

    /// Waiting for the instance to report running
    PollingReady,

    /// Fetching network info and attestation
    Enriching,

    /// Record written
    Recorded,

    /// Aborted before anything was recorded
    Failed,
}

impl CreateState {
    /// Whether the workflow has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreateState::Recorded | CreateState::Failed)
    }

    /// Failures in these stages abort the workflow; later ones degrade it
    pub fn is_fatal_stage(&self) -> bool {
        matches!(
            self,
            CreateState::Validating
                | CreateState::AuthChecking
                | CreateState::NodeSelecting
                | CreateState::Configuring
                | CreateState::Provisioning
        )
    }
}

impl fmt::Display for CreateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreateState::Validating => "validating",
            CreateState::AuthChecking => "auth_checking",
            CreateState::NodeSelecting => "node_selecting",
            CreateState::Configuring => "configuring",
            CreateState::Provisioning => "provisioning",
            CreateState::Activating => "activating",
            CreateState::PollingReady => "polling_ready",
            CreateState::Enriching => "enriching",
            CreateState::Recorded => "recorded",
            CreateState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Create workflow event
#[derive(Debug, Clone)]
pub enum CreateEvent {
    /// Input passed validation
    InputValid,

    /// Provider accepted the token
    Authenticated,

    /// A node was selected
    NodeSelected,

    /// Config and artifact are ready
    Configured,

    /// Provision request accepted
    Provisioned,

    /// Activation finished, with or without fallback
    Activated,

    /// Polling finished, ready or not
    PollingDone,

    /// Record persisted after enrichment
    RecordSaved,

    /// Fatal failure
    Abort(String),
}

/// Create workflow FSM
#[derive(Debug, Clone)]
pub struct CreateFsm {
    state: CreateState,
    error: Option<String>,
    failed_at: Option<CreateState>,
}

impl CreateFsm {
    /// Create a new FSM in the validating state
    pub fn new() -> Self {
        Self {
            state: CreateState::Validating,
            error: None,
            failed_at: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> CreateState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Stage the workflow was in when it aborted
    pub fn failed_at(&self) -> Option<CreateState> {
        self.failed_at
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: CreateEvent) -> Result<CreateState, String> {
        let new_state = match (self.state, &event) {
            (CreateState::Validating, CreateEvent::InputValid) => CreateState::AuthChecking,
            (CreateState::AuthChecking, CreateEvent::Authenticated) => CreateState::NodeSelecting,
            (CreateState::NodeSelecting, CreateEvent::NodeSelected) => CreateState::Configuring,
            (CreateState::Configuring, CreateEvent::Configured) => CreateState::Provisioning,
            (CreateState::Provisioning, CreateEvent::Provisioned) => CreateState::Activating,
            (CreateState::Activating, CreateEvent::Activated) => CreateState::PollingReady,
            (CreateState::PollingReady, CreateEvent::PollingDone) => CreateState::Enriching,
            (CreateState::Enriching, CreateEvent::RecordSaved) => CreateState::Recorded,

            (state, CreateEvent::Abort(err)) if state.is_fatal_stage() => {
                self.error = Some(err.clone());
                self.failed_at = Some(state);
                CreateState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for CreateFsm {
    fn default() -> Self {
        Self::new()
    }
}
