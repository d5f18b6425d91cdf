use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InboundStats {
    pub total: u64,
    pub answered: u64,
    pub missed: u64,
    pub missed_ratio: f64,
    pub total_duration: i64,
    pub avg_duration: f64,
    pub max_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OutboundStats {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub total_duration: i64,
    pub avg_duration: f64,
    pub max_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OverallStats {
    pub total_calls: u64,
    pub total_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CallStats {
    pub inbound: InboundStats,
    pub outbound: OutboundStats,
    pub overall: OverallStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub stats: CallStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayRow {
    pub date: NaiveDate,
    pub total_calls: u64,
    pub total_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PeriodStats {
    pub year: i32,
    pub month: u32,
    pub stats: CallStats,
    pub days: Vec<DayRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WindowCounts {
    pub since: i64,
    pub until: i64,
    pub executions: u64,
    pub events: u64,
    pub status_events: u64,
    pub dtmf_events: u64,
    pub flow_events: u64,
    pub confirmations: u64,
    pub cancellations: u64,
}
