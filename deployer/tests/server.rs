//! REST facade routes, driven through the router without a socket

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{orchestrator, temp_store, FakeGateway};
use tee_deploy::server::serve::router;
use tee_deploy::server::state::ServerState;
use tee_deploy::storage::records::RecordStore;

fn app(gateway: Arc<FakeGateway>, store: RecordStore) -> Router {
    router(Arc::new(ServerState::new(orchestrator(gateway, store))))
}

fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn deploy_body() -> String {
    json!({
        "anthropicKey": "sk-ant-test-key",
        "telegramBotToken": "123456:telegram-bot-token",
        "telegramAllowFrom": "4242",
        "name": "api-bot"
    })
    .to_string()
}

#[tokio::test]
async fn test_health() {
    let (_tmp, store) = temp_store();
    let (status, body) = send(
        app(Arc::new(FakeGateway::default()), store),
        empty_request(Method::GET, "/health"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "openclaw-tee-deploy");
}

#[tokio::test]
async fn test_unknown_route() {
    let (_tmp, store) = temp_store();
    let (status, body) = send(
        app(Arc::new(FakeGateway::default()), store),
        empty_request(Method::GET, "/nope"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_deploy_rejects_invalid_json() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let (status, body) = send(
        app(gateway.clone(), store),
        json_request(Method::POST, "/deploy", "{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_requires_llm_key() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let request = json!({ "telegramBotToken": "1:A", "telegramAllowFrom": "42" }).to_string();

    let (status, body) = send(
        app(gateway.clone(), store),
        json_request(Method::POST, "/deploy", &request),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("LLM key"));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_creates_instance() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();

    let (status, body) = send(
        app(gateway, store.clone()),
        json_request(Method::POST, "/deploy", &deploy_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["cvmId"], "cvm_456");
    assert_eq!(body["name"], "api-bot");
    assert_eq!(body["ready"], true);
    assert_eq!(body["activatedViaFallback"], false);
    assert_eq!(body["attestationChecksum"], "deadbeef");

    let record = store.get("api-bot").await.unwrap();
    assert_eq!(body["gatewayToken"], record.gateway_token);
}

#[tokio::test]
async fn test_deploy_without_instance_id() {
    let gateway = Arc::new(FakeGateway {
        provision_result: json!({ "compose_hash": "abc" }),
        activate_result: None,
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let (status, body) = send(
        app(gateway, store.clone()),
        json_request(Method::POST, "/deploy", &deploy_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cvmId"], Value::Null);
    assert_eq!(body["ready"], false);
    assert_eq!(body["activatedViaFallback"], true);
    assert!(store.get("api-bot").await.is_ok());
}

#[tokio::test]
async fn test_deploy_without_nodes_is_unavailable() {
    let gateway = Arc::new(FakeGateway {
        nodes: Vec::new(),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let (status, body) = send(
        app(gateway, store),
        json_request(Method::POST, "/deploy", &deploy_body()),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No TEE nodes available");
}

#[tokio::test]
async fn test_list_after_deploy() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let app = app(gateway, store);

    let (status, _) = send(
        app.clone(),
        json_request(Method::POST, "/deploy", &deploy_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, empty_request(Method::GET, "/instances")).await;
    assert_eq!(status, StatusCode::OK);

    let instances = body["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0]["instanceId"], "cvm_456");
    assert_eq!(instances[0]["allowedPrincipal"], "4242");
    assert_eq!(instances[0]["liveStatus"], "running");
}

#[tokio::test]
async fn test_instance_detail_and_actions() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let app = app(gateway.clone(), store);

    let (status, body) = send(app.clone(), empty_request(Method::GET, "/instances/cvm_456")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cvm"]["id"], "cvm_456");
    assert_eq!(body["state"]["status"], "running");

    let (status, body) = send(
        app.clone(),
        empty_request(Method::GET, "/instances/cvm_456/attestation"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attestation"]["checksum"], "deadbeef");

    let (status, body) = send(
        app.clone(),
        empty_request(Method::POST, "/instances/cvm_456/restart"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Restarting...");

    let (status, body) = send(app, empty_request(Method::DELETE, "/instances/cvm_456")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Destroyed.");
    assert_eq!(gateway.count("stop"), 1);
    assert_eq!(gateway.count("delete"), 1);
}
