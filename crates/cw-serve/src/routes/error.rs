use axum::Json;
use axum::http::StatusCode;
use cw_core::error::{CallwatchError, StoreError};
use cw_events::NormalizeError;
use cw_provider::ProviderError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &CallwatchError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        CallwatchError::Normalize(normalize) => map_normalize_error(normalize),
        CallwatchError::Store(store) => map_store_error(store),
        CallwatchError::Provider(provider) => map_provider_error(provider),
        CallwatchError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

fn map_normalize_error(err: &NormalizeError) -> (StatusCode, &'static str, String) {
    match err {
        NormalizeError::MissingExecutionId | NormalizeError::InvalidPayload { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Unavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            err.to_string(),
        ),
        StoreError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_provider_error(err: &ProviderError) -> (StatusCode, &'static str, String) {
    match err {
        ProviderError::Unavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "provider_unavailable",
            err.to_string(),
        ),
        ProviderError::InvalidResponse { .. } => (
            StatusCode::BAD_GATEWAY,
            "invalid_response",
            err.to_string(),
        ),
    }
}
