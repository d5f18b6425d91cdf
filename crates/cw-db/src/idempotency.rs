use crate::util::{from_rfc3339, to_rfc3339, unavailable};
use cw_core::StoreError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub struct IdempotencyStore<'a> {
    pub conn: &'a Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub scope_hash: String,
    pub request_hash: String,
    pub response_status: i32,
    pub response_body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl<'a> IdempotencyStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(
        &self,
        key: &str,
        scope_hash: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT key, scope_hash, request_hash, response_status, response_body, \
                 created_at, expires_at FROM idempotency_keys WHERE key = ?1 AND scope_hash = ?2",
            )
            .map_err(unavailable)?;
        let mut rows = stmt.query([key, scope_hash]).map_err(unavailable)?;
        let Some(row) = rows.next().map_err(unavailable)? else {
            return Ok(None);
        };

        let created_at: String = row.get(5).map_err(unavailable)?;
        let expires_at: String = row.get(6).map_err(unavailable)?;
        Ok(Some(IdempotencyRecord {
            key: row.get(0).map_err(unavailable)?,
            scope_hash: row.get(1).map_err(unavailable)?,
            request_hash: row.get(2).map_err(unavailable)?,
            response_status: row.get(3).map_err(unavailable)?,
            response_body: row.get(4).map_err(unavailable)?,
            created_at: from_rfc3339(&created_at)?,
            expires_at: from_rfc3339(&expires_at)?,
        }))
    }

    pub fn insert(&self, record: IdempotencyRecord) -> Result<(), StoreError> {
        let sql = "INSERT OR IGNORE INTO idempotency_keys (key, scope_hash, request_hash, \
                   response_status, response_body, created_at, expires_at) \
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        let params = (
            record.key,
            record.scope_hash,
            record.request_hash,
            record.response_status,
            record.response_body,
            to_rfc3339(&record.created_at),
            to_rfc3339(&record.expires_at),
        );
        self.conn.execute(sql, params).map_err(unavailable)?;
        Ok(())
    }

    pub fn cleanup(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64, StoreError> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM idempotency_keys WHERE expires_at < ?1",
                [to_rfc3339(&now)],
            )
            .map_err(unavailable)?;
        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use chrono::{Duration, Utc};

    fn record(key: &str, expires_in: Duration) -> IdempotencyRecord {
        let now = Utc::now();
        IdempotencyRecord {
            key: key.to_string(),
            scope_hash: "scope".to_string(),
            request_hash: "req".to_string(),
            response_status: 200,
            response_body: "{}".to_string(),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn round_trips_records() {
        let conn = with_test_db().unwrap();
        let store = IdempotencyStore::new(&conn);
        let original = record("k1", Duration::hours(1));
        store.insert(original.clone()).unwrap();

        let loaded = store.get("k1", "scope").unwrap().unwrap();
        assert_eq!(loaded.request_hash, original.request_hash);
        assert_eq!(loaded.response_status, 200);
        assert!(store.get("k1", "other-scope").unwrap().is_none());
    }

    #[test]
    fn cleanup_removes_expired_keys_only() {
        let conn = with_test_db().unwrap();
        let store = IdempotencyStore::new(&conn);
        store.insert(record("stale", Duration::hours(-1))).unwrap();
        store.insert(record("fresh", Duration::hours(1))).unwrap();

        let removed = store.cleanup(Utc::now()).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("stale", "scope").unwrap().is_none());
        assert!(store.get("fresh", "scope").unwrap().is_some());
    }
}
