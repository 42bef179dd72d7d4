#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use fleetcast_core::artifact::ModelArtifact;
use fleetcast_core::pricing::PricingConfig;
use fleetcast_core::registry::ModelRegistry;
use fleetcast_core::training::{self, PricingRow, TrainingConfig};
use fleetcast_core::types::ModelVersion;
use fleetcast_store::{ArtifactStore, DatasetStore, MemoryArtifactStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fleetcast_api::config::ServerConfig;
use fleetcast_api::router::build_app_router;
use fleetcast_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(dataset_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        model_dir: dataset_dir.join("models"),
        dataset_dir: dataset_dir.to_path_buf(),
        pricing: PricingConfig::default(),
    }
}

/// Everything a test needs to drive the app and inspect its state.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<ModelRegistry>,
    pub artifacts: Arc<MemoryArtifactStore>,
    /// Keeps the dataset directory alive for the duration of the test.
    pub dataset_dir: tempfile::TempDir,
}

/// App with an empty registry and an empty artifact store.
pub fn build_test_app() -> TestApp {
    let dataset_dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(dataset_dir.path());
    let registry = Arc::new(ModelRegistry::new());
    let artifacts = Arc::new(MemoryArtifactStore::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        artifacts: Arc::clone(&artifacts) as Arc<dyn ArtifactStore>,
        datasets: Arc::new(DatasetStore::new(dataset_dir.path())),
    };

    TestApp {
        router: build_app_router(state, &config),
        registry,
        artifacts,
        dataset_dir,
    }
}

/// App with version 1 stored and published.
pub async fn build_test_app_with_model() -> TestApp {
    let app = build_test_app();
    let artifact = trained_artifact(1);
    app.artifacts.save(&artifact).await.expect("save artifact");
    app.registry.publish(artifact).expect("publish artifact");
    app
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn vehicle() -> Value {
    json!({
        "mileage": 58_000,
        "engine_power": 135,
        "model_key": "Renault",
        "fuel": "diesel",
        "paint_color": "black",
        "car_type": "estate",
        "private_parking_available": true,
        "has_gps": true,
        "has_air_conditioning": false,
        "automatic_car": false,
        "has_getaround_connect": true,
        "has_speed_regulator": true,
        "winter_tires": true
    })
}

pub fn pricing_rows(n: usize) -> Vec<PricingRow> {
    let brands = ["Audi", "BMW", "Renault", "Peugeot"];
    (0..n)
        .map(|i| {
            let power = 80.0 + (i * 17 % 140) as f64;
            let mileage = 8_000.0 + (i * 4_099 % 160_000) as f64;
            let price = 35.0 + 0.5 * power - 0.0001 * mileage;
            let mut row = vehicle();
            row["mileage"] = json!(mileage);
            row["engine_power"] = json!(power);
            row["model_key"] = json!(brands[i % brands.len()]);
            row["has_gps"] = json!(i % 2 == 0);
            row["rental_price_per_day"] = json!(price);
            serde_json::from_value(row).expect("valid pricing row")
        })
        .collect()
}

pub fn trained_artifact(version: u64) -> ModelArtifact {
    training::fit(&pricing_rows(40), &TrainingConfig::default(), ModelVersion(version))
        .expect("training succeeds")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
