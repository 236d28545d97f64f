//! Error types for tee-deploy

use thiserror::Error;

/// A non-2xx response from the provider control plane
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Phala API {method} {path} failed ({status}) during {operation}: {body}")]
pub struct ProviderError {
    /// Gateway operation that issued the request (e.g. `provision`)
    pub operation: &'static str,
    pub method: String,
    /// Request path, including the target instance id where there is one
    pub path: String,
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ProviderError {
    /// Credentials rejected by the provider
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Main error type for tee-deploy
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("No TEE nodes available")]
    NoNodesAvailable,

    #[error("No instance id recorded for deployment \"{0}\"")]
    MissingInstanceId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Random source error: {0}")]
    Entropy(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),
}

impl DeployError {
    /// Errors caused by the caller's input; these never reach the network
    pub fn is_input_error(&self) -> bool {
        matches!(self, DeployError::Usage(_) | DeployError::Config(_))
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Map provider rejections of the session to [`DeployError::Auth`]
    pub fn into_auth_error(self) -> DeployError {
        match self {
            DeployError::Provider(e) if e.is_unauthorized() => {
                DeployError::Auth(format!("Phala Cloud rejected the API token: {}", e))
            }
            other => other,
        }
    }
}
