//! Create, destroy and inspect workflows against a scripted provider

mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;

use common::{input, orchestrator, temp_store, FakeGateway};
use tee_deploy::deploy::fsm::CreateState;
use tee_deploy::deploy::orchestrator::{InspectDetail, Progress};
use tee_deploy::deploy::poll::Readiness;
use tee_deploy::errors::DeployError;
use tee_deploy::models::deployment::{DestroyOutcome, DestroyTarget};

#[tokio::test]
async fn test_create_records_activated_instance() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());

    let outcome = orchestrator.create(&input(), Some("bot-one")).await.unwrap();

    // id from the create response beats the provision result's app_id
    assert_eq!(outcome.instance_id(), Some("cvm_456"));
    assert!(!outcome.activation.used_fallback());
    assert_eq!(outcome.readiness, Readiness::Ready { attempts: 1 });
    assert_eq!(outcome.public_url(), Some("https://app-123.phala.network"));
    assert_eq!(outcome.attestation_checksum(), Some("deadbeef"));
    assert_eq!(outcome.record.gateway_token.len(), 48);

    let saved = store.get("bot-one").await.unwrap();
    assert_eq!(saved, outcome.record);
    assert_eq!(saved.allowed_principal.as_deref(), Some("4242"));
    assert_eq!(saved.provider_name, "phala");

    let request = gateway.provisioned.lock().unwrap().clone().unwrap();
    assert_eq!(request.name, "bot-one");
    assert_eq!(request.teepod_id, json!(7));
    assert_eq!((request.vcpu, request.memory, request.disk_size), (2, 2048, 10240));
    assert!(!request.compose.contains("sk-ant-test-key"));
}

#[tokio::test]
async fn test_create_falls_back_to_provision_result() {
    let gateway = Arc::new(FakeGateway {
        activate_result: None,
        ..Default::default()
    });
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());

    let outcome = orchestrator.create(&input(), Some("fallback")).await.unwrap();

    assert!(outcome.activation.used_fallback());
    assert_eq!(outcome.instance_id(), Some("app_123"));
    assert_eq!(
        store.get("fallback").await.unwrap().instance_id.as_deref(),
        Some("app_123")
    );
}

#[tokio::test]
async fn test_create_uses_provision_id_when_activation_has_none() {
    let gateway = Arc::new(FakeGateway {
        activate_result: Some(json!({ "status": "creating" })),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway, store)
        .create(&input(), Some("x"))
        .await
        .unwrap();
    assert_eq!(outcome.instance_id(), Some("app_123"));
}

#[tokio::test]
async fn test_create_without_any_instance_id_still_records() {
    let gateway = Arc::new(FakeGateway {
        provision_result: json!({ "compose_hash": "abc" }),
        activate_result: None,
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("nameless"))
        .await
        .unwrap();

    assert_eq!(outcome.readiness, Readiness::UnknownInstance);
    assert_eq!(outcome.instance_id(), None);
    assert!(outcome.network.is_none());
    assert!(outcome.attestation.is_none());
    assert_eq!(gateway.count("provision"), 1);
    assert_eq!(gateway.count("get_state"), 0);
    assert_eq!(gateway.count("get_network"), 0);
    assert_eq!(gateway.count("get_attestation"), 0);

    let saved = store.get("nameless").await.unwrap();
    assert_eq!(saved.instance_id, None);
    assert_eq!(saved.gateway_token, outcome.record.gateway_token);
}

#[tokio::test]
async fn test_destroy_record_without_instance_id() {
    let gateway = Arc::new(FakeGateway {
        provision_result: json!({}),
        activate_result: Some(json!({})),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());
    orchestrator.create(&input(), Some("nameless")).await.unwrap();

    let result = orchestrator
        .destroy(&DestroyTarget::Name("nameless".to_string()), true)
        .await;

    assert!(matches!(result, Err(DeployError::MissingInstanceId(_))));
    assert_eq!(gateway.count("delete"), 0);
    assert!(store.get("nameless").await.is_ok());
}

#[tokio::test]
async fn test_failed_enrichment_is_not_fatal() {
    let gateway = Arc::new(FakeGateway {
        network_status: Some(503),
        attestation_status: Some(404),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("bare"))
        .await
        .unwrap();

    assert!(outcome.network.is_none());
    assert!(outcome.attestation.is_none());
    assert_eq!(gateway.count("get_network"), 1);
    assert_eq!(gateway.count("get_attestation"), 1);
    assert!(store.get("bare").await.is_ok());
}

#[tokio::test]
async fn test_network_failure_keeps_attestation() {
    let gateway = Arc::new(FakeGateway {
        network_status: Some(500),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway, store.clone())
        .create(&input(), Some("half"))
        .await
        .unwrap();

    assert!(outcome.network.is_none());
    assert_eq!(outcome.attestation_checksum(), Some("deadbeef"));
    assert!(store.get("half").await.is_ok());
}

#[tokio::test]
async fn test_attestation_failure_keeps_network() {
    let gateway = Arc::new(FakeGateway {
        attestation_status: Some(500),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway, store.clone())
        .create(&input(), Some("other-half"))
        .await
        .unwrap();

    assert_eq!(outcome.public_url(), Some("https://app-123.phala.network"));
    assert!(outcome.attestation.is_none());
    assert!(store.get("other-half").await.is_ok());
}

#[tokio::test]
async fn test_rejected_token_is_auth_error() {
    let gateway = Arc::new(FakeGateway {
        auth_status: Some(401),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let result = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("x"))
        .await;

    assert!(matches!(result, Err(DeployError::Auth(_))));
    assert_eq!(gateway.calls(), vec!["check_auth"]);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_nodes_available() {
    let gateway = Arc::new(FakeGateway {
        nodes: Vec::new(),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let result = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("x"))
        .await;

    assert!(matches!(result, Err(DeployError::NoNodesAvailable)));
    assert_eq!(gateway.count("provision"), 0);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provision_failure_leaves_no_record() {
    let gateway = Arc::new(FakeGateway {
        provision_status: Some(422),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();

    let result = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("x"))
        .await;

    match result {
        Err(DeployError::Provider(e)) => assert_eq!(e.status, 422),
        other => panic!("unexpected result: {:?}", other.map(|o| o.record)),
    }
    assert_eq!(gateway.count("activate"), 0);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_input_never_reaches_provider() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let mut missing_keys = input();
    missing_keys.anthropic_key = None;

    let result = orchestrator(gateway.clone(), store)
        .create(&missing_keys, Some("x"))
        .await;

    assert!(matches!(result, Err(DeployError::Config(_))));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_ready_on_thirtieth_attempt() {
    let mut states = vec!["starting"; 29];
    states.push("running");
    let gateway = Arc::new(FakeGateway::default().with_states(states));
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway.clone(), store)
        .create(&input(), Some("slow"))
        .await
        .unwrap();

    assert_eq!(outcome.readiness, Readiness::Ready { attempts: 30 });
    assert_eq!(gateway.count("get_state"), 30);
}

#[tokio::test]
async fn test_polling_timeout_still_records() {
    let gateway = Arc::new(FakeGateway::default().with_states(vec!["starting"]));
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway.clone(), store.clone())
        .create(&input(), Some("stuck"))
        .await
        .unwrap();

    assert_eq!(
        outcome.readiness,
        Readiness::TimedOut {
            attempts: 30,
            last_status: Some("starting".to_string()),
        }
    );
    assert_eq!(gateway.count("get_state"), 30);
    assert!(store.get("stuck").await.is_ok());
}

#[tokio::test]
async fn test_progress_reaches_recorded() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();

    orchestrator(gateway, store)
        .with_observer(Arc::new(move |progress| {
            if let Progress::Stage(state) = progress {
                seen.lock().unwrap().push(*state);
            }
        }))
        .create(&input(), Some("observed"))
        .await
        .unwrap();

    let stages = stages.lock().unwrap().clone();
    assert_eq!(stages.first(), Some(&CreateState::AuthChecking));
    assert_eq!(stages.last(), Some(&CreateState::Recorded));
}

#[tokio::test]
async fn test_unconfirmed_destroy_contacts_nobody() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();

    let outcome = orchestrator(gateway.clone(), store)
        .destroy(&DestroyTarget::Id("cvm_456".to_string()), false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DestroyOutcome::Planned {
            instance_id: "cvm_456".to_string()
        }
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_destroy_by_name_removes_record() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());
    orchestrator.create(&input(), Some("doomed")).await.unwrap();

    let outcome = orchestrator
        .destroy(&DestroyTarget::Name("doomed".to_string()), true)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DestroyOutcome::Destroyed {
            instance_id: "cvm_456".to_string(),
            stop_error: None,
            removed_record: Some("doomed".to_string()),
        }
    );
    assert_eq!(gateway.count("stop"), 1);
    assert_eq!(gateway.count("delete"), 1);
    assert!(matches!(store.get("doomed").await, Err(DeployError::NotFound(_))));
}

#[tokio::test]
async fn test_destroy_by_id_ignores_stop_failure() {
    let gateway = Arc::new(FakeGateway {
        stop_status: Some(409),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());
    orchestrator.create(&input(), Some("stopped")).await.unwrap();

    let outcome = orchestrator
        .destroy(&DestroyTarget::Id("cvm_456".to_string()), true)
        .await
        .unwrap();

    match outcome {
        DestroyOutcome::Destroyed {
            stop_error,
            removed_record,
            ..
        } => {
            assert!(stop_error.is_some());
            assert_eq!(removed_record.as_deref(), Some("stopped"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_failure_keeps_record() {
    let gateway = Arc::new(FakeGateway {
        delete_status: Some(500),
        ..Default::default()
    });
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store.clone());
    orchestrator.create(&input(), Some("kept")).await.unwrap();

    let result = orchestrator
        .destroy(&DestroyTarget::Name("kept".to_string()), true)
        .await;

    assert!(matches!(result, Err(DeployError::Provider(_))));
    assert!(store.get("kept").await.is_ok());
}

#[tokio::test]
async fn test_destroy_unknown_name() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();

    let result = orchestrator(gateway.clone(), store)
        .destroy(&DestroyTarget::Name("ghost".to_string()), true)
        .await;

    assert!(matches!(result, Err(DeployError::NotFound(_))));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_inspect_fetches_detail_on_request() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();
    let orchestrator = orchestrator(gateway.clone(), store);

    let report = orchestrator
        .inspect("cvm_456", InspectDetail::default())
        .await;
    assert!(report.instance.is_ok());
    assert!(report.stats.is_none());
    assert!(report.attestation.is_none());
    assert_eq!(gateway.count("get_stats"), 0);

    let report = orchestrator
        .inspect(
            "cvm_456",
            InspectDetail {
                stats: true,
                attestation: true,
            },
        )
        .await;
    assert!(matches!(report.stats, Some(Ok(_))));
    assert!(matches!(report.attestation, Some(Ok(_))));
}

#[test]
fn test_preview_masks_secrets() {
    let gateway = Arc::new(FakeGateway::default());
    let (_tmp, store) = temp_store();

    let preview = orchestrator(gateway.clone(), store).preview(&input()).unwrap();
    let config = serde_json::to_string(&preview.config).unwrap();

    for secret in ["sk-ant-test-key", "123456:telegram-bot-token"] {
        assert!(!preview.compose.contains(secret));
        assert!(!config.contains(secret));
    }
    assert!(gateway.calls().is_empty());
}
