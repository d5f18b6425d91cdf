use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },
    #[error("invalid provider response: {message}")]
    InvalidResponse { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CallRecord {
    pub sid: String,
    #[serde(rename = "to")]
    pub to_number: Option<String>,
    #[serde(rename = "from")]
    pub from_number: Option<String>,
    pub status: String,
    pub duration: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub direction: CallDirection,
}

#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn list_call_records(
        &self,
        window: TimeWindow,
        direction: Option<CallDirection>,
    ) -> Result<Vec<CallRecord>, ProviderError>;
}

// Stands in when no telephony credentials are configured; every query
// surfaces as provider_unavailable instead of failing at startup.
pub struct UnconfiguredProvider;

#[async_trait]
impl CallProvider for UnconfiguredProvider {
    async fn list_call_records(
        &self,
        _window: TimeWindow,
        _direction: Option<CallDirection>,
    ) -> Result<Vec<CallRecord>, ProviderError> {
        Err(ProviderError::Unavailable {
            message: "telephony provider not configured".to_string(),
        })
    }
}
