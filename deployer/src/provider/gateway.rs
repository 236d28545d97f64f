//! Provider control-plane contract

use async_trait::async_trait;
use cloud_api::{
    AccountInfo, Attestation, CvmListing, CvmNetwork, CvmState, CvmStats, ProvisionRequest, Teepod,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DeployError;
use crate::provider::identity::resolve_instance_id;

/// Provider's description of a provisioned or created instance.
///
/// Kept as a raw JSON object: the fields vary between API revisions and the
/// provision result is passed back verbatim on activation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceDescriptor(pub Map<String, Value>);

impl InstanceDescriptor {
    /// Canonical id, see [`crate::provider::identity`]
    pub fn instance_id(&self) -> Option<String> {
        resolve_instance_id(&self.0)
    }

    /// Activation body: the provision result with the instance name set
    pub fn with_name(&self, name: &str) -> InstanceDescriptor {
        let mut fields = self.0.clone();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        InstanceDescriptor(fields)
    }
}

impl From<Value> for InstanceDescriptor {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => InstanceDescriptor(map),
            _ => InstanceDescriptor::default(),
        }
    }
}

/// Control-plane operations the orchestrator depends on.
///
/// Every call fails with [`DeployError::Provider`] on a non-2xx response.
/// Retries, if any, are the implementation's business.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Short provider tag stored in deployment records
    fn provider_name(&self) -> &'static str;

    async fn check_auth(&self) -> Result<AccountInfo, DeployError>;

    async fn list_available_nodes(&self) -> Result<Vec<Teepod>, DeployError>;

    async fn provision(&self, request: &ProvisionRequest)
        -> Result<InstanceDescriptor, DeployError>;

    /// Create the instance from a provision result
    async fn activate(
        &self,
        provisioned: &InstanceDescriptor,
        name: &str,
    ) -> Result<InstanceDescriptor, DeployError>;

    async fn get_instance(&self, id: &str) -> Result<Value, DeployError>;

    async fn get_state(&self, id: &str) -> Result<CvmState, DeployError>;

    async fn get_network(&self, id: &str) -> Result<CvmNetwork, DeployError>;

    async fn get_stats(&self, id: &str) -> Result<CvmStats, DeployError>;

    async fn get_attestation(&self, id: &str) -> Result<Attestation, DeployError>;

    async fn restart(&self, id: &str) -> Result<(), DeployError>;

    async fn stop(&self, id: &str) -> Result<(), DeployError>;

    async fn delete(&self, id: &str) -> Result<(), DeployError>;

    async fn list_all(&self) -> Result<CvmListing, DeployError>;
}
