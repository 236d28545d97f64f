//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use deploy_api::{
    ActionResponse, AttestationResponse, DeployRequest, DeployResponse, HealthResponse,
    InstanceDetailResponse, InstanceListResponse, InstanceSummary,
};
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::deploy::orchestrator::InspectDetail;
use crate::deploy::poll::Readiness;
use crate::models::deployment::{DestroyTarget, LiveRecord};
use crate::server::error::ApiError;
use crate::server::state::ServerState;
use crate::utils::version_info;
use crate::workload::config::WorkloadInput;

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "openclaw-tee-deploy";

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
        version: version_info().version,
    })
}

fn workload_input(request: DeployRequest) -> WorkloadInput {
    WorkloadInput {
        anthropic_key: request.anthropic_key.map(SecretString::from),
        openai_key: request.openai_key.map(SecretString::from),
        bot_token: request.telegram_bot_token.map(SecretString::from),
        allowed_principal: request.telegram_allow_from,
        webhook_url: request.webhook_url,
        port: None,
    }
}

/// Deploy handler: runs the whole create workflow
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;
    let name = request.name.clone();
    let input = workload_input(request);

    let outcome = state.orchestrator.create(&input, name.as_deref()).await?;
    info!(
        "Deployed {} as {}",
        outcome.record.name,
        outcome.instance_id().unwrap_or("<unknown>")
    );

    let ready = outcome.readiness.is_ready();
    let message = match outcome.readiness {
        Readiness::Ready { .. } => "Deployed and running.",
        Readiness::TimedOut { .. } => "Deploying... CVM will be ready in 1-3 minutes.",
        Readiness::UnknownInstance => {
            "Provisioned, but Phala Cloud reported no CVM id. Check the dashboard."
        }
    }
    .to_string();

    Ok((
        StatusCode::CREATED,
        Json(DeployResponse {
            ok: true,
            cvm_id: outcome.record.instance_id.clone(),
            name: outcome.record.name.clone(),
            gateway_token: outcome.record.gateway_token.clone(),
            ready,
            activated_via_fallback: outcome.activation.used_fallback(),
            public_url: outcome.public_url().map(str::to_string),
            attestation_checksum: outcome.attestation_checksum().map(str::to_string),
            message,
        }),
    ))
}

fn instance_summary(live: LiveRecord) -> InstanceSummary {
    InstanceSummary {
        instance_id: live.record.instance_id,
        name: live.record.name,
        created_at: live.record.created_at.to_rfc3339(),
        allowed_principal: live.record.allowed_principal.unwrap_or_default(),
        provider_name: live.record.provider_name,
        live_status: live.live_status,
    }
}

/// List handler: local records with live status
pub async fn list_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiError> {
    let instances = state
        .orchestrator
        .list_with_live_status()
        .await?
        .into_iter()
        .map(instance_summary)
        .collect();

    Ok(Json(InstanceListResponse { instances }))
}

fn to_value<T: Serialize>(result: Result<T, String>) -> Option<Value> {
    result.ok().and_then(|v| serde_json::to_value(v).ok())
}

/// Instance detail handler
pub async fn instance_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let report = state
        .orchestrator
        .inspect(&id, InspectDetail::default())
        .await;

    Json(InstanceDetailResponse {
        cvm: report.instance.ok(),
        state: to_value(report.state),
        network: to_value(report.network),
    })
}

/// Attestation handler
pub async fn attestation_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let attestation = state.orchestrator.attestation(&id).await?;
    let attestation = serde_json::to_value(attestation)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(AttestationResponse { attestation }))
}

/// Restart handler
pub async fn restart_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.orchestrator.restart(&id).await?;

    Ok(Json(ActionResponse {
        ok: true,
        message: "Restarting...".to_string(),
    }))
}

/// Destroy handler. The request itself is the confirmation.
pub async fn destroy_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .orchestrator
        .destroy(&DestroyTarget::Id(id), true)
        .await?;

    Ok(Json(ActionResponse {
        ok: true,
        message: "Destroyed.".to_string(),
    }))
}

/// Unknown routes
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
