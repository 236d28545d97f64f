//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deploy::poll::PollSettings;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::http::client::PHALA_API_BASE;
use crate::logs::LogLevel;
use crate::workload::config::DEFAULT_GATEWAY_PORT;

/// Deployer settings. Every field has a default, so an empty or partial
/// settings file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Provider control-plane configuration
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Local record storage
    #[serde(default)]
    pub storage: StorageSettings,

    /// Resource shape of new instances
    #[serde(default)]
    pub resources: ResourceSettings,

    /// Readiness polling
    #[serde(default)]
    pub polling: PollSettings,

    /// Workload defaults
    #[serde(default)]
    pub workload: WorkloadSettings,

    /// REST facade
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub async fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = File::new(path);
        if !file.exists().await {
            return Err(DeployError::Config(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }

        debug!("Loading settings from {}", path.display());
        file.read_json().await.map_err(|e| {
            DeployError::Config(format!("Invalid settings file {}: {}", path.display(), e))
        })
    }
}

/// Provider API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL for the provider API
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider_url() -> String {
    PHALA_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the `deployments/` record directory
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Instance resource shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub vcpu: u32,
    pub memory_mb: u32,
    pub disk_mb: u32,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            vcpu: 2,
            memory_mb: 2048,
            disk_mb: 10240,
        }
    }
}

/// Workload settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSettings {
    /// Gateway port when the request does not name one
    #[serde(default = "default_gateway_port")]
    pub gateway_port: u16,
}

fn default_gateway_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            gateway_port: default_gateway_port(),
        }
    }
}

/// REST facade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3456
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
