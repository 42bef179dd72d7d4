//! Typed vehicle features and the raw-payload validator.
//!
//! [`validate`] is the only way untyped JSON becomes [`VehicleFeatures`].
//! It walks [`schema::FIELDS`] in order and stops at the first violation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, FieldViolation, ViolationReason};
use crate::schema::{self, CategoricalDomain, FieldKind};

/// A validated vehicle description.
///
/// Categorical values are canonical: either a member of the field's domain
/// or, for fields that declare one, the fallback bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFeatures {
    pub mileage: f64,
    pub engine_power: f64,
    pub model_key: String,
    pub fuel: String,
    pub paint_color: String,
    pub car_type: String,
    pub private_parking_available: bool,
    pub has_gps: bool,
    pub has_air_conditioning: bool,
    pub automatic_car: bool,
    pub has_getaround_connect: bool,
    pub has_speed_regulator: bool,
    pub winter_tires: bool,
}

impl VehicleFeatures {
    /// Numeric value of a schema field, if it is numeric.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            schema::MILEAGE => Some(self.mileage),
            schema::ENGINE_POWER => Some(self.engine_power),
            _ => None,
        }
    }

    /// Categorical value of a schema field, if it is categorical.
    pub fn categorical(&self, field: &str) -> Option<&str> {
        match field {
            schema::MODEL_KEY => Some(&self.model_key),
            schema::FUEL => Some(&self.fuel),
            schema::PAINT_COLOR => Some(&self.paint_color),
            schema::CAR_TYPE => Some(&self.car_type),
            _ => None,
        }
    }

    /// Boolean value of a schema field, if it is boolean.
    pub fn flag(&self, field: &str) -> Option<bool> {
        match field {
            schema::PRIVATE_PARKING_AVAILABLE => Some(self.private_parking_available),
            schema::HAS_GPS => Some(self.has_gps),
            schema::HAS_AIR_CONDITIONING => Some(self.has_air_conditioning),
            schema::AUTOMATIC_CAR => Some(self.automatic_car),
            schema::HAS_GETAROUND_CONNECT => Some(self.has_getaround_connect),
            schema::HAS_SPEED_REGULATOR => Some(self.has_speed_regulator),
            schema::WINTER_TIRES => Some(self.winter_tires),
            _ => None,
        }
    }

    /// Re-run validation over an already typed value.
    ///
    /// Used for rows that were deserialized directly (training data) so they
    /// obey the same domain rules as request payloads.
    pub fn normalized(&self) -> Result<VehicleFeatures, CoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => validate(&map),
            Ok(_) => Err(CoreError::Internal("features did not serialize to an object".into())),
            Err(e) => Err(CoreError::Internal(format!("failed to serialize features: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Parsed value of a single field before assembly.
enum Parsed {
    Number(f64),
    Text(String),
    Flag(bool),
}

/// Validate a raw payload into [`VehicleFeatures`].
///
/// Checks every schema field in canonical order, then rejects any key that
/// is not part of the schema (in lexical order). Returns the first
/// violation found.
pub fn validate(raw: &Map<String, Value>) -> Result<VehicleFeatures, CoreError> {
    let mut parsed = Vec::with_capacity(schema::FIELDS.len());
    for spec in schema::FIELDS {
        let value = parse_field(spec.kind, raw.get(spec.name))
            .map_err(|reason| CoreError::Validation(FieldViolation::new(spec.name, reason)))?;
        parsed.push(value);
    }

    let mut unknown: Vec<&String> = raw
        .keys()
        .filter(|k| schema::find(k).is_none())
        .collect();
    unknown.sort();
    if let Some(key) = unknown.first() {
        return Err(CoreError::Validation(FieldViolation::new(
            key.as_str(),
            ViolationReason::UnexpectedField,
        )));
    }

    assemble(parsed)
}

fn parse_field(kind: FieldKind, value: Option<&Value>) -> Result<Parsed, ViolationReason> {
    let value = match value {
        None | Some(Value::Null) => return Err(ViolationReason::Missing),
        Some(v) => v,
    };

    match kind {
        FieldKind::NonNegative | FieldKind::Positive => {
            let n = value.as_f64().ok_or(ViolationReason::WrongType {
                expected: kind.json_type(),
            })?;
            if !n.is_finite() {
                return Err(ViolationReason::NotFinite);
            }
            match kind {
                FieldKind::NonNegative if n < 0.0 => Err(ViolationReason::Negative),
                FieldKind::Positive if n <= 0.0 => Err(ViolationReason::NotPositive),
                _ => Ok(Parsed::Number(n)),
            }
        }
        FieldKind::Categorical(domain) => {
            let s = value.as_str().ok_or(ViolationReason::WrongType {
                expected: kind.json_type(),
            })?;
            canonical_category(s, domain).map(Parsed::Text)
        }
        FieldKind::Boolean => value
            .as_bool()
            .map(Parsed::Flag)
            .ok_or(ViolationReason::WrongType {
                expected: kind.json_type(),
            }),
    }
}

/// Map a raw categorical string onto its canonical domain value.
///
/// Matching is case-insensitive on ASCII and ignores surrounding
/// whitespace. Values outside the domain go to the fallback bucket when
/// the field has one, and are rejected otherwise.
pub fn canonical_category(raw: &str, domain: CategoricalDomain) -> Result<String, ViolationReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ViolationReason::Empty);
    }

    if let Some(known) = domain
        .values
        .iter()
        .find(|v| v.eq_ignore_ascii_case(trimmed))
    {
        return Ok((*known).to_string());
    }

    match domain.fallback {
        Some(fallback) => Ok(fallback.to_string()),
        None => Err(ViolationReason::OutOfDomain {
            allowed: domain.values.iter().map(|v| v.to_string()).collect(),
        }),
    }
}

fn assemble(parsed: Vec<Parsed>) -> Result<VehicleFeatures, CoreError> {
    let mut numbers = Vec::new();
    let mut texts = Vec::new();
    let mut flags = Vec::new();
    for p in parsed {
        match p {
            Parsed::Number(n) => numbers.push(n),
            Parsed::Text(s) => texts.push(s),
            Parsed::Flag(b) => flags.push(b),
        }
    }

    // Field groups come out in schema order: 2 numbers, 4 categories, 7 flags.
    let [mileage, engine_power]: [f64; 2] = numbers
        .try_into()
        .map_err(|_| CoreError::Internal("schema numeric field count changed".into()))?;
    let [model_key, fuel, paint_color, car_type]: [String; 4] = texts
        .try_into()
        .map_err(|_| CoreError::Internal("schema categorical field count changed".into()))?;
    let [
        private_parking_available,
        has_gps,
        has_air_conditioning,
        automatic_car,
        has_getaround_connect,
        has_speed_regulator,
        winter_tires,
    ]: [bool; 7] = flags
        .try_into()
        .map_err(|_| CoreError::Internal("schema boolean field count changed".into()))?;

    Ok(VehicleFeatures {
        mileage,
        engine_power,
        model_key,
        fuel,
        paint_color,
        car_type,
        private_parking_available,
        has_gps,
        has_air_conditioning,
        automatic_car,
        has_getaround_connect,
        has_speed_regulator,
        winter_tires,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    pub(crate) fn sample_payload() -> Map<String, Value> {
        match json!({
            "mileage": 7.0,
            "engine_power": 120.0,
            "model_key": "Citroën",
            "fuel": "diesel",
            "paint_color": "black",
            "car_type": "sedan",
            "private_parking_available": true,
            "has_gps": true,
            "has_air_conditioning": false,
            "automatic_car": false,
            "has_getaround_connect": true,
            "has_speed_regulator": false,
            "winter_tires": true
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn violation_of(raw: &Map<String, Value>) -> FieldViolation {
        match validate(raw) {
            Err(CoreError::Validation(v)) => v,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_payload() {
        let features = validate(&sample_payload()).unwrap();
        assert_eq!(features.mileage, 7.0);
        assert_eq!(features.model_key, "Citroën");
        assert!(features.winter_tires);
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut raw = sample_payload();
        raw.remove("fuel");
        let v = violation_of(&raw);
        assert_eq!(v.field, "fuel");
        assert_eq!(v.reason, ViolationReason::Missing);
    }

    #[test]
    fn null_counts_as_missing() {
        let mut raw = sample_payload();
        raw.insert("has_gps".into(), Value::Null);
        assert_eq!(violation_of(&raw).reason, ViolationReason::Missing);
    }

    #[test]
    fn reports_first_failing_field_in_schema_order() {
        let mut raw = sample_payload();
        raw.remove("winter_tires");
        raw.insert("mileage".into(), json!(-1.0));
        let v = violation_of(&raw);
        assert_eq!(v.field, "mileage");
        assert_eq!(v.reason, ViolationReason::Negative);
    }

    #[test]
    fn zero_mileage_is_allowed_but_zero_power_is_not() {
        let mut raw = sample_payload();
        raw.insert("mileage".into(), json!(0));
        assert!(validate(&raw).is_ok());

        raw.insert("engine_power".into(), json!(0));
        let v = violation_of(&raw);
        assert_eq!(v.field, "engine_power");
        assert_eq!(v.reason, ViolationReason::NotPositive);
    }

    #[test]
    fn rejects_wrong_json_type() {
        let mut raw = sample_payload();
        raw.insert("automatic_car".into(), json!("yes"));
        let v = violation_of(&raw);
        assert_eq!(v.field, "automatic_car");
        assert_eq!(v.reason, ViolationReason::WrongType { expected: "boolean" });
    }

    #[test]
    fn rejects_out_of_domain_value_for_closed_field() {
        let mut raw = sample_payload();
        raw.insert("fuel".into(), json!("coal"));
        let v = violation_of(&raw);
        assert_eq!(v.field, "fuel");
        assert_matches!(
            v.reason,
            ViolationReason::OutOfDomain { ref allowed } if allowed.contains(&"diesel".to_string())
        );
    }

    #[test]
    fn maps_out_of_domain_value_to_fallback_when_declared() {
        let mut raw = sample_payload();
        raw.insert("paint_color".into(), json!("magenta"));
        raw.insert("model_key".into(), json!("Tesla"));
        let features = validate(&raw).unwrap();
        assert_eq!(features.paint_color, schema::OTHER_CATEGORY);
        assert_eq!(features.model_key, schema::OTHER_CATEGORY);
    }

    #[test]
    fn categorical_matching_is_case_insensitive_and_trimmed() {
        let mut raw = sample_payload();
        raw.insert("car_type".into(), json!("  SUV "));
        raw.insert("model_key".into(), json!("bmw"));
        let features = validate(&raw).unwrap();
        assert_eq!(features.car_type, "suv");
        assert_eq!(features.model_key, "BMW");
    }

    #[test]
    fn rejects_empty_categorical() {
        let mut raw = sample_payload();
        raw.insert("model_key".into(), json!("   "));
        assert_eq!(violation_of(&raw).reason, ViolationReason::Empty);
    }

    #[test]
    fn rejects_unexpected_field() {
        let mut raw = sample_payload();
        raw.insert("rental_price_per_day".into(), json!(100));
        let v = violation_of(&raw);
        assert_eq!(v.field, "rental_price_per_day");
        assert_eq!(v.reason, ViolationReason::UnexpectedField);
    }

    #[test]
    fn normalized_applies_domain_rules_to_typed_values() {
        let mut features = validate(&sample_payload()).unwrap();
        features.paint_color = "Teal".into();
        assert_eq!(features.normalized().unwrap().paint_color, schema::OTHER_CATEGORY);

        features.fuel = "steam".into();
        assert_matches!(features.normalized(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn typed_accessors_cover_every_schema_field() {
        let features = validate(&sample_payload()).unwrap();
        for spec in schema::FIELDS {
            let found = features.numeric(spec.name).is_some()
                || features.categorical(spec.name).is_some()
                || features.flag(spec.name).is_some();
            assert!(found, "no accessor for {}", spec.name);
        }
    }
}
