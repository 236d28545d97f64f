//! Deployment models

use chrono::{DateTime, Utc};
use cloud_api::{Attestation, CvmNetwork, CvmState, CvmStats, Teepod};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deploy::poll::Readiness;

/// Local record of a created deployment, one file per name.
///
/// Older records used `cvmId`, `telegramUser` and `provider`; those names are
/// still accepted on read. A record without an instance id belongs to an
/// instance the provider never named; its gateway token is kept regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// Canonical provider instance id, if the provider reported one
    #[serde(alias = "cvmId", default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// Deployment name, also the record's file name
    pub name: String,

    /// Token for the workload's own gateway API
    pub gateway_token: String,

    pub created_at: DateTime<Utc>,

    /// Telegram user allowed to talk to the bot
    #[serde(alias = "telegramUser", default)]
    pub allowed_principal: Option<String>,

    #[serde(alias = "provider")]
    pub provider_name: String,
}

/// How the instance descriptor was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "activation", rename_all = "snake_case")]
pub enum Activation {
    /// The create call succeeded
    Activated,

    /// The create call failed and the provision result was used instead
    ActivatedViaFallback { reason: String },
}

impl Activation {
    pub fn used_fallback(&self) -> bool {
        matches!(self, Activation::ActivatedViaFallback { .. })
    }
}

/// Result of a create workflow that reached `Recorded`
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub record: DeploymentRecord,
    pub node: Teepod,
    pub activation: Activation,
    pub readiness: Readiness,
    /// Best effort, `None` if the query failed
    pub network: Option<CvmNetwork>,
    /// Best effort, `None` if the query failed
    pub attestation: Option<Attestation>,
}

impl CreateOutcome {
    pub fn instance_id(&self) -> Option<&str> {
        self.record.instance_id.as_deref()
    }

    pub fn public_url(&self) -> Option<&str> {
        self.network.as_ref().and_then(|n| n.public_url())
    }

    pub fn attestation_checksum(&self) -> Option<&str> {
        self.attestation.as_ref().and_then(|a| a.checksum())
    }
}

/// What to destroy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyTarget {
    /// Provider instance id
    Id(String),
    /// Local deployment name
    Name(String),
}

/// Result of a destroy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// Not confirmed: nothing was contacted
    Planned { instance_id: String },

    /// Instance deleted
    Destroyed {
        instance_id: String,
        /// Stop failed and was ignored
        stop_error: Option<String>,
        /// Name of the local record removed, if any
        removed_record: Option<String>,
    },
}

/// Independently fetched views of one instance
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub instance_id: String,
    pub instance: Result<Value, String>,
    pub state: Result<CvmState, String>,
    pub network: Result<CvmNetwork, String>,
    /// Only fetched on request
    pub stats: Option<Result<CvmStats, String>>,
    /// Only fetched on request
    pub attestation: Option<Result<Attestation, String>>,
}

/// Local record with the provider's current view of it
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRecord {
    pub record: DeploymentRecord,
    /// Reported status, `unknown` or `unreachable`
    pub live_status: String,
}
