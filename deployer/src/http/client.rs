//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::{DeployError, ProviderError};

/// Phala Cloud control-plane base URL
pub const PHALA_API_BASE: &str = "https://cloud-api.phala.network/api/v1";

/// Bearer-authenticated JSON client for the provider control plane
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> Result<Self, DeployError> {
        if token.expose_secret().is_empty() {
            return Err(DeployError::Usage("Phala API token required".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, DeployError> {
        let value = self.send(operation, Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DeployError> {
        let value = self.send(operation, Method::POST, path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, DeployError> {
        let value = self.send(operation, Method::DELETE, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request and return the decoded body.
    ///
    /// Bodies that are not JSON come back as a JSON string, empty bodies as
    /// `null`. Any non-2xx status is a [`ProviderError`] with the raw body.
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DeployError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {} ({})", method, url, operation);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("HTTP {} {} failed: {} - {}", method, path, status, text);
            return Err(ProviderError {
                operation,
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        Ok(parse_body(&text))
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
