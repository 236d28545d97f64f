//! API models
//!
//! The control plane is loosely versioned: most responses carry a handful of
//! well-known fields plus whatever else the current API revision returns. The
//! well-known fields are typed, the rest is kept in `extra` so nothing is lost
//! when a response is echoed back to the user.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated account (`GET /auth/me`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountInfo {
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("ok")
    }
}

/// An available TEE node (`GET /teepods/available`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teepod {
    /// Node identifier, passed back verbatim as `teepod_id`
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Teepod {
    /// Human readable label: the node name, falling back to its id
    pub fn label(&self) -> String {
        match (&self.name, &self.id) {
            (Some(name), _) => name.clone(),
            (None, Value::String(id)) => id.clone(),
            (None, id) => id.to_string(),
        }
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or("default")
    }
}

/// Provision request (`POST /cvms/provision`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub name: String,
    pub compose: String,
    pub teepod_id: Value,
    pub vcpu: u32,
    /// Memory in MB
    pub memory: u32,
    /// Disk size in MB
    pub disk_size: u32,
}

/// CVM runtime state (`GET /cvms/{id}/state`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvmState {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CvmState {
    /// Reported status, preferring `status` over `state`
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_deref().or(self.state.as_deref())
    }

    pub fn is_running(&self) -> bool {
        self.status_text()
            .is_some_and(|s| s.eq_ignore_ascii_case("running"))
    }
}

/// CVM resource usage (`GET /cvms/{id}/stats`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvmStats {
    #[serde(default)]
    pub cpu_usage: Option<Value>,
    #[serde(default)]
    pub memory_usage: Option<Value>,
    #[serde(default)]
    pub disk_usage: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// CVM network info (`GET /cvms/{id}/network`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvmNetwork {
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CvmNetwork {
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref().or(self.url.as_deref())
    }
}

/// TEE attestation (`GET /cvms/{id}/attestation`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attestation {
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub quote_checksum: Option<String>,
    #[serde(default)]
    pub tee_type: Option<String>,
    #[serde(default)]
    pub verified: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attestation {
    /// Quote checksum, under whichever name the API used
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref().or(self.quote_checksum.as_deref())
    }

    pub fn issued_at(&self) -> Option<&str> {
        self.timestamp.as_deref().or(self.created_at.as_deref())
    }
}

/// One entry of `GET /cvms`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvmSummary {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CvmSummary {
    pub fn label(&self) -> String {
        match (&self.name, &self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(Value::String(id))) => id.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "?".to_string(),
        }
    }

    pub fn status_text(&self) -> &str {
        self.status
            .as_deref()
            .or(self.state.as_deref())
            .unwrap_or("?")
    }
}

/// `GET /cvms` returns a bare list on current API revisions; anything else is
/// kept verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CvmListing {
    Instances(Vec<CvmSummary>),
    Other(Value),
}
