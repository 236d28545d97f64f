//! Phala Cloud CVM endpoints

use async_trait::async_trait;
use cloud_api::{
    AccountInfo, Attestation, CvmListing, CvmNetwork, CvmState, CvmStats, ProvisionRequest, Teepod,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::provider::{InstanceDescriptor, ProviderGateway};

/// `GET /teepods/available` response
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TeepodListResponse {
    Wrapped { nodes: Vec<Teepod> },
    Bare(Vec<Teepod>),
}

/// Public link for verifying an attestation quote by checksum
pub fn attestation_view_url(base_url: &str, checksum: &str) -> String {
    format!("{}/attestations/view/{}", base_url.trim_end_matches('/'), checksum)
}

impl HttpClient {
    fn cvm_path(id: &str, suffix: &str) -> String {
        format!("/cvms/{}{}", id, suffix)
    }
}

#[async_trait]
impl ProviderGateway for HttpClient {
    fn provider_name(&self) -> &'static str {
        "phala"
    }

    async fn check_auth(&self) -> Result<AccountInfo, DeployError> {
        self.get("check auth", "/auth/me").await
    }

    async fn list_available_nodes(&self) -> Result<Vec<Teepod>, DeployError> {
        let response: Option<TeepodListResponse> =
            self.get("list available nodes", "/teepods/available").await?;
        Ok(match response {
            Some(TeepodListResponse::Wrapped { nodes }) => nodes,
            Some(TeepodListResponse::Bare(nodes)) => nodes,
            None => Vec::new(),
        })
    }

    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<InstanceDescriptor, DeployError> {
        let body = serde_json::to_value(request)?;
        let value: Value = self.post("provision", "/cvms/provision", Some(body)).await?;
        Ok(InstanceDescriptor::from(value))
    }

    async fn activate(
        &self,
        provisioned: &InstanceDescriptor,
        name: &str,
    ) -> Result<InstanceDescriptor, DeployError> {
        let body = serde_json::to_value(provisioned.with_name(name))?;
        let value: Value = self.post("create", "/cvms", Some(body)).await?;
        Ok(InstanceDescriptor::from(value))
    }

    async fn get_instance(&self, id: &str) -> Result<Value, DeployError> {
        self.get("get instance", &Self::cvm_path(id, "")).await
    }

    async fn get_state(&self, id: &str) -> Result<CvmState, DeployError> {
        self.get("get state", &Self::cvm_path(id, "/state")).await
    }

    async fn get_network(&self, id: &str) -> Result<CvmNetwork, DeployError> {
        self.get("get network", &Self::cvm_path(id, "/network")).await
    }

    async fn get_stats(&self, id: &str) -> Result<CvmStats, DeployError> {
        self.get("get stats", &Self::cvm_path(id, "/stats")).await
    }

    async fn get_attestation(&self, id: &str) -> Result<Attestation, DeployError> {
        self.get("get attestation", &Self::cvm_path(id, "/attestation")).await
    }

    async fn restart(&self, id: &str) -> Result<(), DeployError> {
        let _: Value = self.post("restart", &Self::cvm_path(id, "/restart"), None).await?;
        Ok(())
    }

    async fn stop(&self, id: &str) -> Result<(), DeployError> {
        let _: Value = self.post("stop", &Self::cvm_path(id, "/stop"), None).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DeployError> {
        let _: Value = self.delete("delete", &Self::cvm_path(id, "")).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<CvmListing, DeployError> {
        self.get("list instances", "/cvms").await
    }
}
