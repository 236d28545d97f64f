//! Per-deployment secret generation

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::DeployError;

/// Random bytes behind a gateway auth token
pub const GATEWAY_TOKEN_BYTES: usize = 24;

/// Random bytes behind a webhook secret
pub const WEBHOOK_SECRET_BYTES: usize = 32;

/// Secrets minted for one deployment attempt
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedSecrets {
    /// Hex token the workload's own API uses to authenticate callers
    pub gateway_token: String,

    /// Hex secret for channel webhook verification
    pub webhook_secret: String,
}

impl GeneratedSecrets {
    /// Draw a fresh pair from the operating system's CSPRNG
    pub fn generate() -> Result<Self, DeployError> {
        Ok(Self {
            gateway_token: new_gateway_token()?,
            webhook_secret: new_webhook_secret()?,
        })
    }
}

impl fmt::Debug for GeneratedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedSecrets")
            .field("gateway_token", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

pub fn new_gateway_token() -> Result<String, DeployError> {
    random_hex(GATEWAY_TOKEN_BYTES)
}

pub fn new_webhook_secret() -> Result<String, DeployError> {
    random_hex(WEBHOOK_SECRET_BYTES)
}

fn random_hex(len: usize) -> Result<String, DeployError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| DeployError::Entropy(e.to_string()))?;
    Ok(hex::encode(buf))
}
