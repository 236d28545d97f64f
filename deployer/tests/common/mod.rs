//! Shared test fixtures: a scripted in-memory provider

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cloud_api::{
    AccountInfo, Attestation, CvmListing, CvmNetwork, CvmState, CvmStats, ProvisionRequest, Teepod,
};
use futures::FutureExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tempfile::TempDir;

use tee_deploy::deploy::orchestrator::{Orchestrator, OrchestratorOptions};
use tee_deploy::errors::{DeployError, ProviderError};
use tee_deploy::filesys::dir::Dir;
use tee_deploy::provider::{InstanceDescriptor, ProviderGateway};
use tee_deploy::storage::records::RecordStore;
use tee_deploy::workload::config::WorkloadInput;

pub fn provider_error(operation: &'static str, status: u16) -> DeployError {
    ProviderError {
        operation,
        method: "POST".to_string(),
        path: format!("/{}", operation),
        status,
        body: "{\"error\":\"scripted\"}".to_string(),
    }
    .into()
}

/// Scripted provider. Every call is recorded by operation name.
pub struct FakeGateway {
    pub auth_status: Option<u16>,
    pub nodes: Vec<Value>,
    pub provision_status: Option<u16>,
    pub provision_result: Value,
    /// `None` makes activation fail
    pub activate_result: Option<Value>,
    pub stop_status: Option<u16>,
    pub delete_status: Option<u16>,
    pub network_status: Option<u16>,
    pub attestation_status: Option<u16>,
    /// Statuses returned by successive state queries; the last one repeats
    pub states: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<String>>,
    pub provisioned: Mutex<Option<ProvisionRequest>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            auth_status: None,
            nodes: vec![json!({ "id": 7, "name": "prod5", "region": "us-west" })],
            provision_status: None,
            provision_result: json!({ "app_id": "app_123", "compose_hash": "abc" }),
            activate_result: Some(json!({ "id": "cvm_456", "status": "creating" })),
            stop_status: None,
            delete_status: None,
            network_status: None,
            attestation_status: None,
            states: Mutex::new(VecDeque::from(["running".to_string()])),
            calls: Mutex::new(Vec::new()),
            provisioned: Mutex::new(None),
        }
    }
}

impl FakeGateway {
    pub fn with_states(self, states: Vec<&str>) -> Self {
        *self.states.lock().unwrap() = states.into_iter().map(str::to_string).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| *c == operation).count()
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    fn fail(&self, operation: &'static str, status: Option<u16>) -> Result<(), DeployError> {
        match status {
            Some(status) => Err(provider_error(operation, status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    fn provider_name(&self) -> &'static str {
        "phala"
    }

    async fn check_auth(&self) -> Result<AccountInfo, DeployError> {
        self.record("check_auth");
        self.fail("check_auth", self.auth_status)?;
        Ok(AccountInfo {
            username: Some("alice".to_string()),
            ..Default::default()
        })
    }

    async fn list_available_nodes(&self) -> Result<Vec<Teepod>, DeployError> {
        self.record("list_available_nodes");
        Ok(serde_json::from_value(Value::Array(self.nodes.clone()))?)
    }

    async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> Result<InstanceDescriptor, DeployError> {
        self.record("provision");
        self.fail("provision", self.provision_status)?;
        *self.provisioned.lock().unwrap() = Some(request.clone());
        Ok(InstanceDescriptor::from(self.provision_result.clone()))
    }

    async fn activate(
        &self,
        _provisioned: &InstanceDescriptor,
        _name: &str,
    ) -> Result<InstanceDescriptor, DeployError> {
        self.record("activate");
        match &self.activate_result {
            Some(result) => Ok(InstanceDescriptor::from(result.clone())),
            None => Err(provider_error("activate", 500)),
        }
    }

    async fn get_instance(&self, id: &str) -> Result<Value, DeployError> {
        self.record("get_instance");
        Ok(json!({ "id": id, "name": "openclaw-test", "status": "running" }))
    }

    async fn get_state(&self, _id: &str) -> Result<CvmState, DeployError> {
        self.record("get_state");
        let mut states = self.states.lock().unwrap();
        let status = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().cloned()
        };
        Ok(CvmState {
            status,
            ..Default::default()
        })
    }

    async fn get_network(&self, _id: &str) -> Result<CvmNetwork, DeployError> {
        self.record("get_network");
        self.fail("get_network", self.network_status)?;
        Ok(CvmNetwork {
            public_url: Some("https://app-123.phala.network".to_string()),
            ..Default::default()
        })
    }

    async fn get_stats(&self, _id: &str) -> Result<CvmStats, DeployError> {
        self.record("get_stats");
        Ok(CvmStats::default())
    }

    async fn get_attestation(&self, _id: &str) -> Result<Attestation, DeployError> {
        self.record("get_attestation");
        self.fail("get_attestation", self.attestation_status)?;
        Ok(Attestation {
            checksum: Some("deadbeef".to_string()),
            ..Default::default()
        })
    }

    async fn restart(&self, _id: &str) -> Result<(), DeployError> {
        self.record("restart");
        Ok(())
    }

    async fn stop(&self, _id: &str) -> Result<(), DeployError> {
        self.record("stop");
        self.fail("stop", self.stop_status)
    }

    async fn delete(&self, _id: &str) -> Result<(), DeployError> {
        self.record("delete");
        self.fail("delete", self.delete_status)
    }

    async fn list_all(&self) -> Result<CvmListing, DeployError> {
        self.record("list_all");
        Ok(CvmListing::Instances(Vec::new()))
    }
}

/// Valid create input
pub fn input() -> WorkloadInput {
    WorkloadInput {
        anthropic_key: Some(SecretString::from("sk-ant-test-key")),
        openai_key: None,
        bot_token: Some(SecretString::from("123456:telegram-bot-token")),
        allowed_principal: Some("4242".to_string()),
        webhook_url: None,
        port: None,
    }
}

/// Record store in a fresh temp dir; keep the `TempDir` alive
pub fn temp_store() -> (TempDir, RecordStore) {
    let tmp = TempDir::new().unwrap();
    let store = RecordStore::new(Dir::new(tmp.path().join("deployments")));
    (tmp, store)
}

/// Orchestrator over `gateway` that never sleeps
pub fn orchestrator(gateway: Arc<FakeGateway>, store: RecordStore) -> Orchestrator {
    Orchestrator::new(gateway, store, OrchestratorOptions::default())
        .with_sleep_fn(Arc::new(|_| async {}.boxed()))
}
