use crate::types::{DtmfAction, EventKind, EventRecord, EventSource};
use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("missing execution id")]
    MissingExecutionId,
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}

pub fn normalize(raw: Value) -> Result<EventRecord, NormalizeError> {
    let Some(object) = raw.as_object() else {
        return Err(NormalizeError::InvalidPayload {
            message: "payload must be a json object".to_string(),
        });
    };

    let execution_id =
        str_field(object, "execution_id").ok_or(NormalizeError::MissingExecutionId)?;

    let status = str_field(object, "status");
    let digits = str_field(object, "digits");
    let kind = if status.is_some() {
        EventKind::Status
    } else if digits.is_some() {
        EventKind::Dtmf
    } else {
        EventKind::Flow
    };
    let action = match kind {
        EventKind::Dtmf => digits.as_deref().and_then(DtmfAction::from_digits),
        EventKind::Status | EventKind::Flow => None,
    };

    let now = Utc::now();
    let occurred_at = int_field(object, "occurred_at").unwrap_or(now.timestamp_millis());

    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        execution_id,
        kind,
        call_id: str_field(object, "call_id"),
        to_number: str_field(object, "to"),
        from_number: str_field(object, "from"),
        status,
        digits,
        action,
        occurred_at,
        received_at: now,
        source: EventSource::Webhook,
        correlation_id: None,
        raw,
    })
}

// Webhook payloads arrive in both snake_case and camelCase depending on the
// carrier's callback version.
fn str_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    lookup(object, key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn int_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    lookup(object, key).and_then(Value::as_i64)
}

fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = object.get(key) {
        return Some(value);
    }
    object.get(&camel_case(key))
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_execution_id() {
        let err = normalize(json!({ "status": "ringing" })).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingExecutionId));

        let err = normalize(json!({ "execution_id": "  ", "status": "ringing" })).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingExecutionId));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = normalize(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidPayload { .. }));
    }

    #[test]
    fn classifies_by_distinguishing_field() {
        let status = normalize(json!({ "execution_id": "x", "status": "ringing" })).unwrap();
        assert_eq!(status.kind, EventKind::Status);
        assert_eq!(status.status.as_deref(), Some("ringing"));

        let dtmf = normalize(json!({ "execution_id": "x", "digits": "1" })).unwrap();
        assert_eq!(dtmf.kind, EventKind::Dtmf);

        let flow = normalize(json!({ "execution_id": "x", "call_id": "c1" })).unwrap();
        assert_eq!(flow.kind, EventKind::Flow);
    }

    #[test]
    fn status_wins_classification_over_digits() {
        let event =
            normalize(json!({ "execution_id": "x", "status": "completed", "digits": "1" }))
                .unwrap();
        assert_eq!(event.kind, EventKind::Status);
        assert_eq!(event.action, None);
    }

    #[test]
    fn maps_digits_to_actions() {
        let event = normalize(json!({ "execution_id": "x", "digits": "1" })).unwrap();
        assert_eq!(event.action, Some(DtmfAction::ConfirmAppointment));

        let event = normalize(json!({ "execution_id": "x", "digits": "2" })).unwrap();
        assert_eq!(event.action, Some(DtmfAction::CancelAppointment));

        let event = normalize(json!({ "execution_id": "x", "digits": "3" })).unwrap();
        assert_eq!(event.action, Some(DtmfAction::ConnectRepresentative));
    }

    #[test]
    fn unmapped_digits_are_recorded_without_action() {
        let event = normalize(json!({ "execution_id": "x", "digits": "9" })).unwrap();
        assert_eq!(event.kind, EventKind::Dtmf);
        assert_eq!(event.digits.as_deref(), Some("9"));
        assert_eq!(event.action, None);
    }

    #[test]
    fn accepts_camel_case_payloads() {
        let event = normalize(json!({
            "executionId": "x",
            "callId": "c1",
            "occurredAt": 42,
            "status": "answered"
        }))
        .unwrap();
        assert_eq!(event.execution_id, "x");
        assert_eq!(event.call_id.as_deref(), Some("c1"));
        assert_eq!(event.occurred_at, 42);
    }

    #[test]
    fn keeps_raw_payload_and_blank_identity() {
        let payload = json!({ "execution_id": "x", "status": "ringing", "extra": { "a": 1 } });
        let event = normalize(payload.clone()).unwrap();
        assert_eq!(event.raw, payload);
        assert!(event.id.is_empty());
        assert_eq!(event.seq, 0);
    }
}
