pub mod execution;
pub mod io;
pub mod stats;

pub use execution::{DtmfEntry, ExecutionState, ExecutionSummary};
pub use io::{Page, WindowQuery};
pub use stats::{
    CallStats, DailySummary, DayRow, InboundStats, OutboundStats, OverallStats, PeriodStats,
    WindowCounts,
};
