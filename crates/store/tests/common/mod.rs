#![allow(dead_code)]

use fleetcast_core::artifact::ModelArtifact;
use fleetcast_core::training::{self, PricingRow, TrainingConfig};
use fleetcast_core::types::ModelVersion;
use serde_json::json;

/// A small, varied pricing dataset with a known linear price rule.
pub fn pricing_rows(n: usize) -> Vec<PricingRow> {
    let brands = ["Audi", "BMW", "Citroën", "Renault"];
    (0..n)
        .map(|i| {
            let power = 80.0 + (i * 13 % 150) as f64;
            let mileage = 5_000.0 + (i * 3_571 % 150_000) as f64;
            let gps = i % 2 == 0;
            let price = 30.0 + 0.6 * power - 0.0001 * mileage + if gps { 5.0 } else { 0.0 };
            serde_json::from_value(json!({
                "mileage": mileage,
                "engine_power": power,
                "model_key": brands[i % brands.len()],
                "fuel": if i % 3 == 0 { "petrol" } else { "diesel" },
                "paint_color": "grey",
                "car_type": "estate",
                "private_parking_available": i % 4 == 0,
                "has_gps": gps,
                "has_air_conditioning": true,
                "automatic_car": false,
                "has_getaround_connect": i % 5 == 0,
                "has_speed_regulator": false,
                "winter_tires": true,
                "rental_price_per_day": price
            }))
            .expect("valid pricing row")
        })
        .collect()
}

pub fn trained_artifact(version: u64) -> ModelArtifact {
    training::fit(&pricing_rows(40), &TrainingConfig::default(), ModelVersion(version))
        .expect("training succeeds")
}
