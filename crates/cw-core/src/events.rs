use crate::error::StoreError;
use crate::types::io::WindowQuery;
use crate::types::stats::WindowCounts;
use cw_events::types::EventRecord;

pub trait EventRepository {
    fn append(&self, event: EventRecord) -> Result<EventRecord, StoreError>;

    fn list(&self, after: Option<i64>, limit: Option<u32>)
    -> Result<Vec<EventRecord>, StoreError>;

    fn list_by_execution(&self, execution_id: &str) -> Result<Vec<EventRecord>, StoreError>;

    fn list_executions(&self, limit: u32, offset: u32) -> Result<(Vec<String>, u64), StoreError>;

    fn counts_for(&self, window: WindowQuery) -> Result<WindowCounts, StoreError>;
}
