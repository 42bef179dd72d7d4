use serde::Serialize;

use crate::types::ModelVersion;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(FieldViolation),

    #[error("No model artifact is loaded")]
    ModelNotLoaded,

    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Model version {0} not found")]
    NotFound(ModelVersion),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The first field of an input that failed validation, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: ViolationReason,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field '{}' {}", self.field, self.reason)
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    Missing,
    WrongType { expected: &'static str },
    NotFinite,
    Negative,
    NotPositive,
    Empty,
    OutOfDomain { allowed: Vec<String> },
    UnexpectedField,
    OutOfRange { message: String },
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "is required"),
            Self::WrongType { expected } => write!(f, "must be a {expected}"),
            Self::NotFinite => write!(f, "must be a finite number"),
            Self::Negative => write!(f, "must not be negative"),
            Self::NotPositive => write!(f, "must be greater than zero"),
            Self::Empty => write!(f, "must not be empty"),
            Self::OutOfDomain { allowed } => write!(f, "must be one of: {}", allowed.join(", ")),
            Self::UnexpectedField => write!(f, "is not a recognised field"),
            Self::OutOfRange { message } => write!(f, "{message}"),
        }
    }
}

/// Convert `validator` derive errors into a single [`CoreError::Validation`].
///
/// Field names are sorted so the reported field is stable across runs.
pub fn from_validation_errors(errors: validator::ValidationErrors) -> CoreError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().cloned().collect();
    fields.sort();

    let Some(field) = fields.into_iter().next() else {
        return CoreError::Internal("validation failed without field errors".into());
    };

    let message = field_errors
        .get(&field)
        .and_then(|errs| errs.first())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("failed '{}' check", e.code))
        })
        .unwrap_or_else(|| "is invalid".to_string());

    out_of_range(field, message)
}

/// A [`CoreError::Validation`] for a value outside its permitted range.
pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> CoreError {
    CoreError::Validation(FieldViolation::new(
        field,
        ViolationReason::OutOfRange {
            message: message.into(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_names_field_and_reason() {
        let v = FieldViolation::new("mileage", ViolationReason::Negative);
        assert_eq!(v.to_string(), "field 'mileage' must not be negative");
    }

    #[test]
    fn out_of_domain_lists_allowed_values() {
        let reason = ViolationReason::OutOfDomain {
            allowed: vec!["diesel".into(), "petrol".into()],
        };
        assert_eq!(reason.to_string(), "must be one of: diesel, petrol");
    }

    #[test]
    fn reason_serializes_with_kind_tag() {
        let reason = ViolationReason::WrongType { expected: "boolean" };
        let json = serde_json::to_value(reason).unwrap();
        assert_eq!(json["kind"], "wrong_type");
        assert_eq!(json["expected"], "boolean");
    }
}
