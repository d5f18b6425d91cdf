use cw_events::types::{DtmfAction, EventRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DtmfEntry {
    pub digits: String,
    pub action: Option<DtmfAction>,
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionState {
    pub execution_id: String,
    pub call_id: Option<String>,
    #[serde(rename = "to")]
    pub to_number: Option<String>,
    #[serde(rename = "from")]
    pub from_number: Option<String>,
    pub status: Option<String>,
    pub dtmf_actions: Vec<DtmfEntry>,
    pub events: Vec<EventRecord>,
    pub created_at: Option<i64>,
    pub last_activity: Option<i64>,
}

impl ExecutionState {
    pub fn empty(execution_id: &str) -> Self {
        Self {
            execution_id: execution_id.to_string(),
            call_id: None,
            to_number: None,
            from_number: None,
            status: None,
            dtmf_actions: Vec::new(),
            events: Vec::new(),
            created_at: None,
            last_activity: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            execution_id: self.execution_id.clone(),
            call_id: self.call_id.clone(),
            to_number: self.to_number.clone(),
            from_number: self.from_number.clone(),
            status: self.status.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            event_count: self.events.len() as u64,
            dtmf_count: self.dtmf_actions.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub call_id: Option<String>,
    #[serde(rename = "to")]
    pub to_number: Option<String>,
    #[serde(rename = "from")]
    pub from_number: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<i64>,
    pub last_activity: Option<i64>,
    pub event_count: u64,
    pub dtmf_count: u64,
}
