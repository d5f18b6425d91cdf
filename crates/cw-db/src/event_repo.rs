use crate::util::{
    decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339, unavailable,
};
use cw_core::StoreError;
use cw_core::events::EventRepository;
use cw_core::types::io::WindowQuery;
use cw_core::types::stats::WindowCounts;
use cw_events::types::EventRecord;
use rusqlite::Connection;
use ulid::Ulid;

const EVENT_COLUMNS: &str = "id, seq, execution_id, kind, call_id, to_number, from_number, \
     status, digits, action, occurred_at, received_at, source, correlation_id, raw_json";

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for EventRepo<'_> {
    fn append(&self, mut event: EventRecord) -> Result<EventRecord, StoreError> {
        // Seq assignment and insert run inside the caller's BEGIN IMMEDIATE
        // transaction, so concurrent webhook deliveries cannot race the
        // MAX(seq) read.
        event.seq = next_seq(self.conn)?;
        event.id = format!("evt_{}", Ulid::new());

        let sql = format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)");
        let params = (
            event.id.clone(),
            event.seq,
            event.execution_id.clone(),
            encode_enum(&event.kind)?,
            event.call_id.clone(),
            event.to_number.clone(),
            event.from_number.clone(),
            event.status.clone(),
            event.digits.clone(),
            event
                .action
                .as_ref()
                .map(encode_enum)
                .transpose()?,
            event.occurred_at,
            to_rfc3339(&event.received_at),
            encode_enum(&event.source)?,
            event.correlation_id.clone(),
            encode_json(&event.raw)?,
        );
        self.conn.execute(&sql, params).map_err(unavailable)?;
        Ok(event)
    }

    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events");
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(after) = after {
            sql.push_str(" WHERE seq > ?");
            params.push(after.into());
        }
        sql.push_str(" ORDER BY seq ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(i64::from(limit).into());
        }

        let mut stmt = self.conn.prepare(&sql).map_err(unavailable)?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(unavailable)?;
        collect_events(&mut rows)
    }

    fn list_by_execution(&self, execution_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE execution_id = ?1 ORDER BY seq ASC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(unavailable)?;
        let mut rows = stmt.query([execution_id]).map_err(unavailable)?;
        collect_events(&mut rows)
    }

    fn list_executions(&self, limit: u32, offset: u32) -> Result<(Vec<String>, u64), StoreError> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(DISTINCT execution_id) FROM events", [], |row| {
                row.get(0)
            })
            .map_err(unavailable)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT execution_id FROM events GROUP BY execution_id \
                 ORDER BY MAX(occurred_at) DESC, MAX(seq) DESC LIMIT ?1 OFFSET ?2",
            )
            .map_err(unavailable)?;
        let mut rows = stmt
            .query(rusqlite::params![i64::from(limit), i64::from(offset)])
            .map_err(unavailable)?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            ids.push(row.get(0).map_err(unavailable)?);
        }
        Ok((ids, total as u64))
    }

    fn counts_for(&self, window: WindowQuery) -> Result<WindowCounts, StoreError> {
        let sql = "SELECT \
             COUNT(*), \
             COUNT(DISTINCT execution_id), \
             COALESCE(SUM(CASE WHEN kind = 'Status' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN kind = 'Dtmf' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN kind = 'Flow' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN action = 'confirm_appointment' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN action = 'cancel_appointment' THEN 1 ELSE 0 END), 0) \
             FROM events WHERE occurred_at >= ?1 AND occurred_at < ?2";
        self.conn
            .query_row(sql, rusqlite::params![window.since, window.until], |row| {
                let column = |index: usize| -> rusqlite::Result<u64> {
                    row.get::<_, i64>(index).map(|value| value as u64)
                };
                Ok(WindowCounts {
                    since: window.since,
                    until: window.until,
                    events: column(0)?,
                    executions: column(1)?,
                    status_events: column(2)?,
                    dtmf_events: column(3)?,
                    flow_events: column(4)?,
                    confirmations: column(5)?,
                    cancellations: column(6)?,
                })
            })
            .map_err(unavailable)
    }
}

fn collect_events(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<EventRecord>, StoreError> {
    let mut events = Vec::new();
    while let Some(row) = rows.next().map_err(unavailable)? {
        events.push(map_event_row(row)?);
    }
    Ok(events)
}

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<EventRecord, StoreError> {
    let kind: String = row.get(3).map_err(unavailable)?;
    let action: Option<String> = row.get(9).map_err(unavailable)?;
    let received_at: String = row.get(11).map_err(unavailable)?;
    let source: String = row.get(12).map_err(unavailable)?;
    let raw_json: String = row.get(14).map_err(unavailable)?;

    Ok(EventRecord {
        id: row.get(0).map_err(unavailable)?,
        seq: row.get(1).map_err(unavailable)?,
        execution_id: row.get(2).map_err(unavailable)?,
        kind: decode_enum(&kind)?,
        call_id: row.get(4).map_err(unavailable)?,
        to_number: row.get(5).map_err(unavailable)?,
        from_number: row.get(6).map_err(unavailable)?,
        status: row.get(7).map_err(unavailable)?,
        digits: row.get(8).map_err(unavailable)?,
        action: action.as_deref().map(decode_enum).transpose()?,
        occurred_at: row.get(10).map_err(unavailable)?,
        received_at: from_rfc3339(&received_at)?,
        source: decode_enum(&source)?,
        correlation_id: row.get(13).map_err(unavailable)?,
        raw: decode_json(&raw_json)?,
    })
}

fn next_seq(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM events", [], |row| {
        row.get(0)
    })
    .map_err(unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use chrono::Utc;
    use cw_events::normalize::normalize;
    use serde_json::json;

    fn repo_event(execution_id: &str, occurred_at: i64) -> EventRecord {
        let mut event = normalize(json!({
            "execution_id": execution_id,
            "status": "completed",
        }))
        .unwrap();
        event.occurred_at = occurred_at;
        event.received_at = Utc::now();
        event
    }

    #[test]
    fn append_assigns_increasing_seq_and_id() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);

        let first = repo.append(repo_event("x", 100)).unwrap();
        let second = repo.append(repo_event("y", 90)).unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert!(first.id.starts_with("evt_"));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn list_by_execution_orders_by_seq_and_round_trips() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);

        let mut dtmf = normalize(json!({ "execution_id": "x", "digits": "1" })).unwrap();
        dtmf.occurred_at = 50;
        repo.append(repo_event("x", 100)).unwrap();
        repo.append(dtmf).unwrap();
        repo.append(repo_event("other", 10)).unwrap();

        let events = repo.list_by_execution("x").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[1].seq, 2);
        assert_eq!(events[1].digits.as_deref(), Some("1"));
        assert_eq!(events[0].raw["status"], "completed");
    }

    #[test]
    fn unknown_execution_returns_empty_not_error() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);
        let events = repo.list_by_execution("missing").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn list_respects_after_and_limit() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);
        for n in 0..5 {
            repo.append(repo_event("x", 100 + n)).unwrap();
        }

        let events = repo.list(Some(2), Some(2)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 3);
        assert_eq!(events[1].seq, 4);
    }

    #[test]
    fn executions_rank_by_latest_activity() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);
        repo.append(repo_event("old", 100)).unwrap();
        repo.append(repo_event("new", 300)).unwrap();
        repo.append(repo_event("mid", 200)).unwrap();

        let (ids, total) = repo.list_executions(10, 0).unwrap();
        assert_eq!(total, 3);
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn window_counts_are_half_open() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);
        let mut confirm = normalize(json!({ "execution_id": "a", "digits": "1" })).unwrap();
        confirm.occurred_at = 100;
        repo.append(confirm).unwrap();
        repo.append(repo_event("a", 150)).unwrap();
        repo.append(repo_event("b", 200)).unwrap();

        let counts = repo
            .counts_for(WindowQuery {
                since: 100,
                until: 200,
            })
            .unwrap();
        assert_eq!(counts.events, 2);
        assert_eq!(counts.executions, 1);
        assert_eq!(counts.status_events, 1);
        assert_eq!(counts.dtmf_events, 1);
        assert_eq!(counts.confirmations, 1);
        assert_eq!(counts.cancellations, 0);
    }

    #[test]
    fn empty_window_counts_are_zero() {
        let conn = with_test_db().unwrap();
        let repo = EventRepo::new(&conn);
        let counts = repo
            .counts_for(WindowQuery { since: 0, until: 10 })
            .unwrap();
        assert_eq!(counts.events, 0);
        assert_eq!(counts.executions, 0);
        assert_eq!(counts.confirmations, 0);
    }
}
