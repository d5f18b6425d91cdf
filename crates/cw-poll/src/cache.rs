use crate::error::PollError;
use chrono::{DateTime, Utc};
use cw_events::types::EventRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

// last_seq is recorded for log lines only; change detection stays
// count-based so the poller's behavior matches the dashboard it replaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedView {
    pub events: Vec<EventRecord>,
    pub last_seen_count: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub last_seq: i64,
}

impl CachedView {
    pub fn load(path: &Path) -> Result<Self, PollError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(cache_err)?;
        match serde_json::from_str(&data) {
            Ok(view) => Ok(view),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding unreadable cache");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PollError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(cache_err)?;
        }
        let data = serde_json::to_vec(self).map_err(cache_err)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data).map_err(cache_err)?;
        std::fs::rename(&tmp, path).map_err(cache_err)?;
        Ok(())
    }
}

fn cache_err(err: impl std::fmt::Display) -> PollError {
    PollError::Cache {
        message: err.to_string(),
    }
}
