//! Application configuration options
//!
//! Settings file values and command line credentials are merged once, at
//! startup, into an immutable [`AppOptions`]. Nothing below this point reads
//! the environment.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::deploy::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::storage::layout::StorageLayout;
use crate::storage::records::RecordStore;
use crate::storage::settings::Settings;

/// Provider credentials as given on the command line (or its env fallback)
#[derive(Debug, Default)]
pub struct ProviderCredentials {
    pub token: Option<SecretString>,
}

/// Provider connection options
#[derive(Debug)]
pub struct ProviderOptions {
    pub base_url: Url,
    pub token: SecretString,
    pub request_timeout: Duration,
}

/// REST facade options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3456,
        }
    }
}

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    pub provider: ProviderOptions,
    pub layout: StorageLayout,
    pub orchestrator: OrchestratorOptions,
    pub server: ServerOptions,
}

impl AppOptions {
    /// Merge settings with the provider credentials.
    ///
    /// Fails with [`DeployError::Usage`] when no provider token was given and
    /// [`DeployError::Config`] when the provider URL is invalid.
    pub fn resolve(settings: &Settings, credentials: ProviderCredentials) -> Result<Self, DeployError> {
        let token = credentials
            .token
            .filter(|t| !t.expose_secret().trim().is_empty())
            .ok_or_else(|| {
                DeployError::Usage("Missing --phala-token or PHALA_API_TOKEN".to_string())
            })?;

        let base_url = Url::parse(&settings.provider.base_url).map_err(|e| {
            DeployError::Config(format!(
                "Invalid provider base URL {}: {}",
                settings.provider.base_url, e
            ))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(DeployError::Config(format!(
                "Provider base URL must be http(s): {}",
                base_url
            )));
        }

        Ok(Self {
            provider: ProviderOptions {
                base_url,
                token,
                request_timeout: Duration::from_secs(settings.provider.request_timeout_secs),
            },
            layout: StorageLayout::new(&settings.storage.base_dir),
            orchestrator: OrchestratorOptions {
                resources: settings.resources,
                polling: settings.polling,
                default_port: settings.workload.gateway_port,
            },
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
        })
    }

    /// Override the facade port
    pub fn with_server_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// Provider client for these options
    pub fn http_client(&self) -> Result<HttpClient, DeployError> {
        HttpClient::new(
            self.provider.base_url.as_str(),
            SecretString::from(self.provider.token.expose_secret().to_string()),
            self.provider.request_timeout,
        )
    }

    /// Orchestrator over the provider client and the local record store
    pub fn orchestrator(&self) -> Result<Orchestrator, DeployError> {
        Ok(Orchestrator::new(
            Arc::new(self.http_client()?),
            RecordStore::from_layout(&self.layout),
            self.orchestrator,
        ))
    }
}
