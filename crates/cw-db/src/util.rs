use chrono::{DateTime, Utc};
use cw_core::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        message: err.to_string(),
    }
}

pub fn invalid(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidInput {
        message: err.to_string(),
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidInput {
            message: format!("invalid timestamp: {value}"),
        })
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(invalid)
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, StoreError> {
    serde_json::from_str(value).map_err(invalid)
}

pub fn encode_enum<T: Serialize>(value: &T) -> Result<String, StoreError> {
    let json = serde_json::to_value(value).map_err(invalid)?;
    match json {
        Value::String(value) => Ok(value),
        other => Err(StoreError::InvalidInput {
            message: format!("invalid enum value: {other}"),
        }),
    }
}

pub fn decode_enum<T: DeserializeOwned>(value: &str) -> Result<T, StoreError> {
    serde_json::from_value(Value::String(value.to_string())).map_err(invalid)
}
