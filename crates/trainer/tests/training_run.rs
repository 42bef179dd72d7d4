//! End-to-end training runs against a temporary model directory.

use std::path::Path;

use fleetcast_core::training::TrainingConfig;
use fleetcast_core::types::ModelVersion;
use fleetcast_store::{ArtifactStore, FsArtifactStore};
use fleetcast_trainer::{run, TrainerConfig};
use serde_json::{json, Value};

fn pricing_rows(n: usize) -> Value {
    let brands = ["Citroën", "Peugeot", "BMW", "Audi"];
    let rows: Vec<Value> = (0..n)
        .map(|i| {
            let power = 90.0 + (i * 13 % 120) as f64;
            let mileage = 10_000.0 + (i * 3_571 % 150_000) as f64;
            json!({
                "mileage": mileage,
                "engine_power": power,
                "model_key": brands[i % brands.len()],
                "fuel": if i % 3 == 0 { "petrol" } else { "diesel" },
                "paint_color": "grey",
                "car_type": "sedan",
                "private_parking_available": i % 2 == 0,
                "has_gps": true,
                "has_air_conditioning": i % 4 == 0,
                "automatic_car": false,
                "has_getaround_connect": i % 5 == 0,
                "has_speed_regulator": true,
                "winter_tires": true,
                "rental_price_per_day": 40.0 + 0.4 * power - 0.0001 * mileage
            })
        })
        .collect();
    Value::Array(rows)
}

fn config(dir: &Path) -> TrainerConfig {
    let data_path = dir.join("pricing.json");
    std::fs::write(&data_path, pricing_rows(50).to_string()).unwrap();
    TrainerConfig {
        data_path,
        model_dir: dir.join("models"),
        training: TrainingConfig::default(),
    }
}

#[tokio::test]
async fn stores_successive_versions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let first = run(&config).await.unwrap();
    let second = run(&config).await.unwrap();
    assert_eq!(first.version, ModelVersion(1));
    assert_eq!(second.version, ModelVersion(2));
    assert_eq!(first.metrics, second.metrics);

    let store = FsArtifactStore::open(&config.model_dir).await.unwrap();
    assert_eq!(store.list_versions().await.unwrap(), vec![ModelVersion(1), ModelVersion(2)]);
    let latest = store.load_latest().await.unwrap().unwrap();
    assert_eq!(latest.version, ModelVersion(2));
}

#[tokio::test]
async fn missing_data_file_fails_without_storing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.data_path = dir.path().join("absent.json");

    let err = run(&config).await.unwrap_err();
    assert!(err.to_string().contains("absent.json"));
    assert!(!config.model_dir.exists());
}

#[tokio::test]
async fn too_few_rows_fail_without_storing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    std::fs::write(&config.data_path, pricing_rows(3).to_string()).unwrap();

    assert!(run(&config).await.is_err());

    let store = FsArtifactStore::open(&config.model_dir).await.unwrap();
    assert!(store.list_versions().await.unwrap().is_empty());
}
