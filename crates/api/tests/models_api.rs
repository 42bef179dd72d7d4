//! Integration tests for the model management endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, get, post_json, test_config, trained_artifact, vehicle};
use fleetcast_api::router::build_app_router;
use fleetcast_api::state::AppState;
use fleetcast_core::registry::ModelRegistry;
use fleetcast_core::types::ModelVersion;
use fleetcast_store::{ArtifactStore, DatasetStore, FsArtifactStore};
use serde_json::json;

#[tokio::test]
async fn lists_stored_versions_and_the_current_one() {
    let app = common::build_test_app_with_model().await;
    app.artifacts.save(&trained_artifact(2)).await.unwrap();

    let response = get(app.router, "/api/v1/models").await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = &body_json(response).await["data"];
    assert_eq!(data["versions"], json!([1, 2]));
    assert_eq!(data["current"], 1);
}

#[tokio::test]
async fn current_model_summary() {
    let app = common::build_test_app_with_model().await;
    let data = &body_json(get(app.router, "/api/v1/models/current").await).await["data"];

    assert_eq!(data["version"], 1);
    assert!(data["feature_count"].as_u64().unwrap() > 13);
    assert_eq!(data["fingerprint"].as_str().unwrap().len(), 64);
    assert!(data["metrics"]["rmse"].is_number());
}

#[tokio::test]
async fn current_model_without_one_is_503() {
    let app = common::build_test_app();
    let response = get(app.router, "/api/v1/models/current").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "MODEL_NOT_LOADED");
}

#[tokio::test]
async fn reload_publishes_the_newest_stored_version() {
    let app = common::build_test_app_with_model().await;
    app.artifacts.save(&trained_artifact(2)).await.unwrap();

    let response = post_json(app.router.clone(), "/api/v1/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["version"], 2);
    assert_eq!(app.registry.current_version(), Some(ModelVersion(2)));

    let response = post_json(app.router, "/api/v1/predict", json!({ "input": [vehicle()] })).await;
    assert_eq!(body_json(response).await["data"]["model_version"], 2);
}

#[tokio::test]
async fn reloading_the_serving_version_is_a_conflict() {
    let app = common::build_test_app_with_model().await;
    let response = post_json(app.router, "/api/v1/models/reload", json!({ "version": 1 })).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn reload_with_an_empty_store_is_404() {
    let app = common::build_test_app();
    let response = post_json(app.router, "/api/v1/models/reload", json!({})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn reload_of_an_unknown_version_is_404() {
    let app = common::build_test_app_with_model().await;
    let response = post_json(app.router, "/api/v1/models/reload", json!({ "version": 9 })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Filesystem-backed store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reload_serves_a_model_trained_and_saved_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let artifacts = FsArtifactStore::open(&config.model_dir).await.unwrap();
    artifacts.save(&trained_artifact(1)).await.unwrap();

    let registry = Arc::new(ModelRegistry::new());
    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        artifacts: Arc::new(artifacts.clone()),
        datasets: Arc::new(DatasetStore::new(dir.path())),
    };
    let router = build_app_router(state, &config);

    let response = post_json(router.clone(), "/api/v1/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(registry.current_version(), Some(ModelVersion(1)));

    let body = json!({ "input": [vehicle()] });
    let response = post_json(router.clone(), "/api/v1/predict", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["model_version"], 1);

    // A second training run lands on disk and is picked up by reload.
    artifacts.save(&trained_artifact(2)).await.unwrap();
    let response = post_json(router.clone(), "/api/v1/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(router, "/api/v1/models").await).await;
    assert_eq!(json["data"]["versions"], json!([1, 2]));
    assert_eq!(json["data"]["current"], 2);
}

#[tokio::test]
async fn latest_artifact_on_disk_publishes_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = FsArtifactStore::open(dir.path()).await.unwrap();
    artifacts.save(&trained_artifact(1)).await.unwrap();

    // Same sequence the binary runs before serving.
    let registry = ModelRegistry::new();
    let latest = artifacts.load_latest().await.unwrap().unwrap();
    registry.publish(latest).unwrap();

    assert_eq!(registry.current_version(), Some(ModelVersion(1)));
}
