//! Facade API models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

/// Deploy request (`POST /deploy`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    #[serde(default)]
    pub anthropic_key: Option<String>,
    #[serde(default)]
    pub openai_key: Option<String>,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_allow_from: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Deploy response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub ok: bool,
    /// Absent when the provider never reported an instance id
    #[serde(default)]
    pub cvm_id: Option<String>,
    pub name: String,
    pub gateway_token: String,
    pub ready: bool,
    pub activated_via_fallback: bool,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub attestation_checksum: Option<String>,
    pub message: String,
}

/// A locally recorded instance with its live status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    #[serde(default)]
    pub instance_id: Option<String>,
    pub name: String,
    pub created_at: String,
    pub allowed_principal: String,
    pub provider_name: String,
    pub live_status: String,
}

/// Instance list response (`GET /instances`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceListResponse {
    pub instances: Vec<InstanceSummary>,
}

/// Instance detail response (`GET /instances/{id}`)
///
/// Each part is fetched independently; a part the provider could not serve
/// is `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDetailResponse {
    pub cvm: Option<Value>,
    pub state: Option<Value>,
    pub network: Option<Value>,
}

/// Attestation response (`GET /instances/{id}/attestation`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationResponse {
    pub attestation: Value,
}

/// Restart/destroy response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

/// Error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
