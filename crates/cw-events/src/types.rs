use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    pub id: String,
    pub seq: i64,
    pub execution_id: String,
    pub kind: EventKind,
    pub call_id: Option<String>,
    #[serde(rename = "to")]
    pub to_number: Option<String>,
    #[serde(rename = "from")]
    pub from_number: Option<String>,
    pub status: Option<String>,
    pub digits: Option<String>,
    pub action: Option<DtmfAction>,
    pub occurred_at: i64,
    pub received_at: DateTime<Utc>,
    pub source: EventSource,
    pub correlation_id: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum EventKind {
    Status,
    Dtmf,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DtmfAction {
    ConfirmAppointment,
    CancelAppointment,
    ConnectRepresentative,
}

impl DtmfAction {
    pub fn from_digits(digits: &str) -> Option<Self> {
        match digits.trim() {
            "1" => Some(Self::ConfirmAppointment),
            "2" => Some(Self::CancelAppointment),
            "3" => Some(Self::ConnectRepresentative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum EventSource {
    Webhook,
    Ui,
    Cli,
}
