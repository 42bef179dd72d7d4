use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fleetcast_core::error::{CoreError, FieldViolation};
use fleetcast_store::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`StoreError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `fleetcast_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An artifact or dataset persistence error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// One item of a batch request failed validation.
    #[error("Item {index}: {violation}")]
    InvalidItem {
        index: usize,
        violation: FieldViolation,
    },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(v) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    v.to_string(),
                    Some(json!({ "field": v.field, "reason": v.reason })),
                ),
                CoreError::ModelNotLoaded => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "MODEL_NOT_LOADED",
                    "No price model is loaded".to_string(),
                    None,
                ),
                CoreError::FeatureMismatch(msg) => {
                    tracing::error!(error = %msg, "Model artifact does not match input schema");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "FEATURE_MISMATCH",
                        "The loaded model does not match the input schema".to_string(),
                        None,
                    )
                }
                CoreError::InsufficientData(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INSUFFICIENT_DATA",
                    msg.clone(),
                    None,
                ),
                CoreError::NotFound(version) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Model {version} not found"),
                    None,
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
                CoreError::TrainingFailed(msg) | CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                        None,
                    )
                }
            },

            // --- Store errors ---
            AppError::Store(err) => classify_store_error(err),

            // --- HTTP-specific errors ---
            AppError::InvalidItem { index, violation } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                format!("input[{index}]: {violation}"),
                Some(json!({
                    "index": index,
                    "field": violation.field,
                    "reason": violation.reason,
                })),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - `NotFound` maps to 404, `InvalidName` to 400, `AlreadyExists` to 409.
/// - Corrupt artifacts, I/O and serialization failures map to 500 with a
///   sanitized message.
fn classify_store_error(
    err: &StoreError,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match err {
        StoreError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{what} not found"),
            None,
        ),
        StoreError::InvalidName(name) => (
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            format!("Invalid dataset name '{name}'"),
            None,
        ),
        StoreError::AlreadyExists(version) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Model {version} already exists"),
            None,
        ),
        StoreError::Corrupt { version, reason } => {
            tracing::error!(%version, %reason, "Stored artifact failed verification");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ARTIFACT_CORRUPT",
                format!("Stored model {version} failed verification"),
                None,
            )
        }
        StoreError::Io { .. } | StoreError::Serialization(_) => {
            tracing::error!(error = %err, "Store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
                None,
            )
        }
    }
}
