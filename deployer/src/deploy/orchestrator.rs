//! Deployment orchestrator
//!
//! Drives the create workflow through [`CreateFsm`] and the destroy and status
//! operations against a [`ProviderGateway`] and the local [`RecordStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cloud_api::{Attestation, CvmListing, CvmNetwork, ProvisionRequest};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::deploy::fsm::{CreateEvent, CreateFsm, CreateState};
use crate::deploy::poll::{poll_until_ready, PollAttempt, PollSettings, Readiness};
use crate::errors::DeployError;
use crate::models::deployment::{
    Activation, CreateOutcome, DeploymentRecord, DestroyOutcome, DestroyTarget, InstanceReport,
    LiveRecord,
};
use crate::provider::identity::INSTANCE_ID_FIELDS;
use crate::provider::ProviderGateway;
use crate::storage::records::RecordStore;
use crate::storage::settings::ResourceSettings;
use crate::utils::default_instance_name;
use crate::workload::bootstrap::{self, DryRunPreview};
use crate::workload::config::{ConfigBuilder, WorkloadInput, DEFAULT_GATEWAY_PORT};

/// Sleep used between state queries
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Receives progress of a running create workflow
pub type ProgressObserver = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Create workflow progress
#[derive(Debug, Clone)]
pub enum Progress {
    Stage(CreateState),
    Authenticated { account: String },
    NodeSelected { node: String, region: String },
    Provisioned { instance_id: Option<String> },
    ActivationFallback { reason: String },
    Poll(PollAttempt),
}

/// Orchestrator options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub resources: ResourceSettings,
    pub polling: PollSettings,
    /// Gateway port when the input does not name one
    pub default_port: u16,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            resources: ResourceSettings::default(),
            polling: PollSettings::default(),
            default_port: DEFAULT_GATEWAY_PORT,
        }
    }
}

/// What `inspect` fetches besides instance, state and network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectDetail {
    pub stats: bool,
    pub attestation: bool,
}

/// Deployment orchestrator
pub struct Orchestrator {
    gateway: Arc<dyn ProviderGateway>,
    store: RecordStore,
    options: OrchestratorOptions,
    sleep_fn: SleepFn,
    observer: Option<ProgressObserver>,
}

impl Orchestrator {
    /// Create a new orchestrator sleeping on the tokio timer
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        store: RecordStore,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            gateway,
            store,
            options,
            sleep_fn: Arc::new(|duration| tokio::time::sleep(duration).boxed()),
            observer: None,
        }
    }

    /// Replace the sleep between state queries
    pub fn with_sleep_fn(mut self, sleep_fn: SleepFn) -> Self {
        self.sleep_fn = sleep_fn;
        self
    }

    /// Report create progress to `observer`
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    fn emit(&self, progress: Progress) {
        if let Some(observer) = &self.observer {
            observer(&progress);
        }
    }

    fn advance(&self, fsm: &mut CreateFsm, event: CreateEvent) -> Result<(), DeployError> {
        let state = fsm.process(event).map_err(DeployError::Workflow)?;
        info!("Create workflow: {}", state);
        self.emit(Progress::Stage(state));
        Ok(())
    }

    fn abort(&self, fsm: &mut CreateFsm, err: DeployError) -> DeployError {
        let stage = fsm.state();
        if let Err(e) = fsm.process(CreateEvent::Abort(err.to_string())) {
            warn!("{}", e);
        }
        error!("Create workflow aborted while {}: {}", stage, err);
        err
    }

    /// Run the create workflow.
    ///
    /// Fails without a record if validation, auth, node selection,
    /// configuration or provisioning fail. After provisioning the workflow
    /// always ends with a saved record; activation fallback, polling timeout,
    /// a missing instance id and missing enrichment are reported in the
    /// outcome.
    pub async fn create(
        &self,
        input: &WorkloadInput,
        name: Option<&str>,
    ) -> Result<CreateOutcome, DeployError> {
        let mut fsm = CreateFsm::new();
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => default_instance_name(Utc::now()),
        };
        info!("Creating deployment {}", name);

        if let Err(e) = input.validate().and_then(|_| RecordStore::validate_name(&name)) {
            return Err(self.abort(&mut fsm, e));
        }
        self.advance(&mut fsm, CreateEvent::InputValid)?;

        let account = match self.gateway.check_auth().await {
            Ok(account) => account,
            Err(e) => return Err(self.abort(&mut fsm, e.into_auth_error())),
        };
        self.emit(Progress::Authenticated {
            account: account.display_name().to_string(),
        });
        self.advance(&mut fsm, CreateEvent::Authenticated)?;

        let node = match self.gateway.list_available_nodes().await {
            Ok(nodes) => match nodes.into_iter().next() {
                Some(node) => node,
                None => return Err(self.abort(&mut fsm, DeployError::NoNodesAvailable)),
            },
            Err(e) => return Err(self.abort(&mut fsm, e)),
        };
        self.emit(Progress::NodeSelected {
            node: node.label(),
            region: node.region_or_default().to_string(),
        });
        self.advance(&mut fsm, CreateEvent::NodeSelected)?;

        let built = ConfigBuilder::new(input)
            .with_default_port(self.options.default_port)
            .build()
            .and_then(|bundle| bootstrap::render(&bundle).map(|artifact| (bundle, artifact)));
        let (bundle, artifact) = match built {
            Ok(built) => built,
            Err(e) => return Err(self.abort(&mut fsm, e)),
        };
        self.advance(&mut fsm, CreateEvent::Configured)?;

        let request = ProvisionRequest {
            name: name.clone(),
            compose: artifact.compose,
            teepod_id: node.id.clone(),
            vcpu: self.options.resources.vcpu,
            memory: self.options.resources.memory_mb,
            disk_size: self.options.resources.disk_mb,
        };
        let provisioned = match self.gateway.provision(&request).await {
            Ok(provisioned) => provisioned,
            Err(e) => return Err(self.abort(&mut fsm, e)),
        };
        self.emit(Progress::Provisioned {
            instance_id: provisioned.instance_id(),
        });
        self.advance(&mut fsm, CreateEvent::Provisioned)?;

        let (descriptor, activation) = match self.gateway.activate(&provisioned, &name).await {
            Ok(created) => (created, Activation::Activated),
            Err(e) => {
                // Some API revisions create the instance during provisioning
                warn!("Activation failed, using the provision result: {}", e);
                let reason = e.to_string();
                self.emit(Progress::ActivationFallback {
                    reason: reason.clone(),
                });
                (provisioned.clone(), Activation::ActivatedViaFallback { reason })
            }
        };
        let instance_id = descriptor.instance_id().or_else(|| provisioned.instance_id());
        match &instance_id {
            Some(id) => info!("Instance id: {}", id),
            None => warn!(
                "Instance {} was provisioned but the provider reported no id (looked for {}); \
                 skipping readiness and enrichment",
                name,
                INSTANCE_ID_FIELDS.join(", ")
            ),
        }
        self.advance(&mut fsm, CreateEvent::Activated)?;

        let readiness = match &instance_id {
            Some(id) => {
                poll_until_ready(
                    self.gateway.as_ref(),
                    id,
                    &self.options.polling,
                    |duration| (self.sleep_fn)(duration),
                    |attempt| self.emit(Progress::Poll(attempt.clone())),
                )
                .await
            }
            None => Readiness::UnknownInstance,
        };
        self.advance(&mut fsm, CreateEvent::PollingDone)?;

        let (network, attestation) = match &instance_id {
            Some(id) => self.enrich(id).await,
            None => (None, None),
        };

        let record = DeploymentRecord {
            instance_id,
            name,
            gateway_token: bundle.secrets.gateway_token.clone(),
            created_at: Utc::now(),
            allowed_principal: input.allowed_principal().map(str::to_string),
            provider_name: self.gateway.provider_name().to_string(),
        };
        self.store.save(&record).await?;
        self.advance(&mut fsm, CreateEvent::RecordSaved)?;

        Ok(CreateOutcome {
            record,
            node,
            activation,
            readiness,
            network,
            attestation,
        })
    }

    /// Network and attestation, queried concurrently. Either may fail alone.
    async fn enrich(&self, instance_id: &str) -> (Option<CvmNetwork>, Option<Attestation>) {
        let (network, attestation) = futures::join!(
            self.gateway.get_network(instance_id),
            self.gateway.get_attestation(instance_id)
        );
        let network = network
            .map_err(|e| warn!("Network info not yet available: {}", e))
            .ok();
        let attestation = attestation
            .map_err(|e| warn!("Attestation not yet available: {}", e))
            .ok();
        (network, attestation)
    }

    /// Render what `create` would submit, with secrets masked. No network calls.
    pub fn preview(&self, input: &WorkloadInput) -> Result<DryRunPreview, DeployError> {
        let bundle = ConfigBuilder::new(input)
            .with_default_port(self.options.default_port)
            .build()?;
        bootstrap::render_preview(&bundle)
    }

    /// Destroy an instance: best-effort stop, delete, forget the local record.
    ///
    /// Without confirmation only the target is resolved; the provider is not
    /// contacted.
    pub async fn destroy(
        &self,
        target: &DestroyTarget,
        confirmed: bool,
    ) -> Result<DestroyOutcome, DeployError> {
        let (instance_id, record_name) = match target {
            DestroyTarget::Id(id) => (id.clone(), None),
            DestroyTarget::Name(name) => {
                let record = self.store.get(name).await?;
                let instance_id = record
                    .instance_id
                    .ok_or_else(|| DeployError::MissingInstanceId(name.clone()))?;
                info!("Resolved {} to instance {}", name, instance_id);
                (instance_id, Some(record.name))
            }
        };

        if !confirmed {
            return Ok(DestroyOutcome::Planned { instance_id });
        }

        info!("Destroying instance {}", instance_id);

        let stop_error = match self.gateway.stop(&instance_id).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Stop failed, instance may already be stopped: {}", e);
                Some(e.to_string())
            }
        };

        self.gateway.delete(&instance_id).await?;

        let record_name = match record_name {
            Some(name) => Some(name),
            None => self
                .store
                .find_by_instance_id(&instance_id)
                .await?
                .map(|record| record.name),
        };
        let removed_record = match record_name {
            Some(name) if self.store.remove(&name).await? => Some(name),
            _ => None,
        };

        Ok(DestroyOutcome::Destroyed {
            instance_id,
            stop_error,
            removed_record,
        })
    }

    /// Fetch instance, state and network concurrently, plus stats and
    /// attestation on request. Each view fails independently.
    pub async fn inspect(&self, instance_id: &str, detail: InspectDetail) -> InstanceReport {
        let stats = async {
            if detail.stats {
                Some(self.gateway.get_stats(instance_id).await)
            } else {
                None
            }
        };
        let attestation = async {
            if detail.attestation {
                Some(self.gateway.get_attestation(instance_id).await)
            } else {
                None
            }
        };

        let (instance, state, network, stats, attestation) = futures::join!(
            self.gateway.get_instance(instance_id),
            self.gateway.get_state(instance_id),
            self.gateway.get_network(instance_id),
            stats,
            attestation
        );

        InstanceReport {
            instance_id: instance_id.to_string(),
            instance: instance.map_err(|e| e.to_string()),
            state: state.map_err(|e| e.to_string()),
            network: network.map_err(|e| e.to_string()),
            stats: stats.map(|r| r.map_err(|e| e.to_string())),
            attestation: attestation.map(|r| r.map_err(|e| e.to_string())),
        }
    }

    /// Local records
    pub async fn list_local(&self) -> Result<Vec<DeploymentRecord>, DeployError> {
        self.store.list().await
    }

    /// Local records with their live status, queried concurrently
    pub async fn list_with_live_status(&self) -> Result<Vec<LiveRecord>, DeployError> {
        let records = self.store.list().await?;

        let statuses = join_all(records.iter().map(|record| async move {
            let Some(instance_id) = record.instance_id.as_deref() else {
                return "unknown".to_string();
            };
            match self.gateway.get_state(instance_id).await {
                Ok(state) => state.status_text().unwrap_or("unknown").to_string(),
                Err(e) => {
                    warn!("State of {} unavailable: {}", instance_id, e);
                    "unreachable".to_string()
                }
            }
        }))
        .await;

        Ok(records
            .into_iter()
            .zip(statuses)
            .map(|(record, live_status)| LiveRecord {
                record,
                live_status,
            })
            .collect())
    }

    /// Every instance the provider knows about
    pub async fn list_remote(&self) -> Result<CvmListing, DeployError> {
        self.gateway.list_all().await
    }

    pub async fn restart(&self, instance_id: &str) -> Result<(), DeployError> {
        info!("Restarting instance {}", instance_id);
        self.gateway.restart(instance_id).await
    }

    pub async fn attestation(&self, instance_id: &str) -> Result<Attestation, DeployError> {
        self.gateway.get_attestation(instance_id).await
    }
}
