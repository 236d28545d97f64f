//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::DeployError;
use crate::server::handlers::{
    attestation_handler, deploy_handler, destroy_handler, health_handler, instance_handler,
    list_handler, not_found_handler, restart_handler,
};
use crate::server::state::ServerState;

/// Build the facade router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/deploy", post(deploy_handler))
        .route("/instances", get(list_handler))
        .route(
            "/instances/{id}",
            get(instance_handler).delete(destroy_handler),
        )
        .route("/instances/{id}/attestation", get(attestation_handler))
        .route("/instances/{id}/restart", post(restart_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the facade until `shutdown_signal` resolves
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DeployError::Server(format!("Failed to bind {}: {}", addr, e)))?;
    info!("OpenClaw TEE deploy API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| DeployError::Server(e.to_string()))
}
