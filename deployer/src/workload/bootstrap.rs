//! Container bootstrap artifact
//!
//! Renders the compose descriptor submitted to the provider. The generated
//! documents travel inside the container command as base64 blobs, which keeps
//! arbitrary JSON intact through YAML, compose interpolation and shell quoting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::DeployError;
use crate::workload::config::{WorkloadBundle, WorkloadConfig};

/// Static persona written into the agent workspace
pub const PERSONA_DOCUMENT: &str = "# SOUL.md\n\
You are a helpful personal AI assistant. Be concise, friendly, and proactive.\n\
Respect privacy. Be honest about being an AI.\n";

/// Stands in for the credential blob in dry-run output
pub const REDACTED_PROFILES_BLOB: &str = "<redacted: credential profiles>";

/// A rendered compose descriptor and the blobs embedded in it
#[derive(Debug, Clone)]
pub struct BootstrapArtifact {
    pub compose: String,
    pub config_blob: String,
    pub profiles_blob: String,
}

/// Dry-run view of a deployment: nothing in it carries a usable secret
#[derive(Debug, Clone)]
pub struct DryRunPreview {
    /// Compose descriptor with the redacted config and no credential blob
    pub compose: String,
    pub config: WorkloadConfig,
}

/// Pretty JSON, base64 encoded
pub fn encode_document<T: Serialize>(document: &T) -> Result<String, DeployError> {
    let json = serde_json::to_string_pretty(document)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Inverse of [`encode_document`]
pub fn decode_document<T: DeserializeOwned>(blob: &str) -> Result<T, DeployError> {
    let bytes = STANDARD.decode(blob)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Render the deployable compose descriptor for a bundle. Pure: the same
/// bundle always renders the same text.
pub fn render(bundle: &WorkloadBundle) -> Result<BootstrapArtifact, DeployError> {
    let config_blob = encode_document(&bundle.config)?;
    let profiles_blob = encode_document(&bundle.profiles)?;
    let compose = compose_text(&config_blob, &profiles_blob, bundle.config.gateway.port);

    Ok(BootstrapArtifact {
        compose,
        config_blob,
        profiles_blob,
    })
}

/// Render the dry-run preview. Works on a redacted copy; `bundle` is untouched.
pub fn render_preview(bundle: &WorkloadBundle) -> Result<DryRunPreview, DeployError> {
    let config = bundle.config.redacted();
    let config_blob = encode_document(&config)?;
    let compose = compose_text(&config_blob, REDACTED_PROFILES_BLOB, config.gateway.port);

    Ok(DryRunPreview { compose, config })
}

fn compose_text(config_blob: &str, profiles_blob: &str, port: u16) -> String {
    let persona_blob = STANDARD.encode(PERSONA_DOCUMENT.as_bytes());

    // `$$` survives compose interpolation as a literal `$`
    format!(
        r#"version: "3.8"

services:
  openclaw:
    image: node:22-slim
    working_dir: /app
    command: >
      bash -c "
        set -e;
        echo 'Installing OpenClaw...';
        npm install -g openclaw@latest pnpm 2>&1 | tail -1;
        export OPENCLAW_HOME=/app/.openclaw;
        mkdir -p \$$OPENCLAW_HOME/agents/main/agent \$$OPENCLAW_HOME/workspace;
        echo '{profiles_blob}' | base64 -d > \$$OPENCLAW_HOME/agents/main/agent/auth-profiles.json;
        chmod 600 \$$OPENCLAW_HOME/agents/main/agent/auth-profiles.json;
        echo '{config_blob}' | base64 -d > \$$OPENCLAW_HOME/openclaw.json;
        chmod 600 \$$OPENCLAW_HOME/openclaw.json;
        echo '{persona_blob}' | base64 -d > \$$OPENCLAW_HOME/workspace/SOUL.md;
        echo 'Starting OpenClaw gateway...';
        openclaw gateway start --foreground
      "
    environment:
      - OPENCLAW_HOME=/app/.openclaw
      - NODE_ENV=production
    ports:
      - "{port}:{port}"
    volumes:
      - openclaw-data:/app/.openclaw
    restart: unless-stopped

volumes:
  openclaw-data:
"#
    )
}
