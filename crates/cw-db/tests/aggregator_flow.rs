use cw_core::aggregator::{Aggregator, RequestContext};
use cw_core::types::io::WindowQuery;
use cw_db::schema::with_test_db;
use cw_db::store::DbStore;
use cw_events::bus::EventBus;
use cw_events::types::{DtmfAction, EventSource};
use serde_json::json;

fn aggregator() -> Aggregator<DbStore> {
    let conn = with_test_db().expect("in-memory db");
    Aggregator::new(DbStore::new(conn), EventBus::new(16))
}

fn ctx() -> RequestContext {
    RequestContext::new(EventSource::Webhook, Some("corr-test".to_string()))
}

#[test]
fn ingest_to_execution_state_round_trip() {
    let aggregator = aggregator();
    let ctx = ctx();

    let first = aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "X", "status": "initiated", "occurred_at": 1000 }),
        )
        .unwrap();
    aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "X", "digits": "1", "occurred_at": 2000 }),
        )
        .unwrap();
    let last = aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "X", "status": "completed", "occurred_at": 3000 }),
        )
        .unwrap();

    assert_eq!(first.seq, 1);
    assert_eq!(last.seq, 3);

    let state = aggregator.executions().get("X").unwrap();
    assert_eq!(state.status.as_deref(), Some("completed"));
    assert_eq!(state.events.len(), 3);
    assert_eq!(state.dtmf_actions.len(), 1);
    assert_eq!(state.dtmf_actions[0].digits, "1");
    assert_eq!(
        state.dtmf_actions[0].action,
        Some(DtmfAction::ConfirmAppointment)
    );
    assert_eq!(state.created_at, Some(1000));
    assert_eq!(state.last_activity, Some(3000));
}

#[test]
fn ingest_rejects_payload_without_execution_id() {
    let aggregator = aggregator();
    let err = aggregator
        .events()
        .ingest(&ctx(), json!({ "status": "ringing" }))
        .unwrap_err();
    assert!(matches!(
        err,
        cw_core::CallwatchError::Normalize(cw_events::NormalizeError::MissingExecutionId)
    ));

    // Nothing was persisted.
    assert!(aggregator.events().list(None, None).unwrap().is_empty());
}

#[test]
fn ingest_stamps_request_context_onto_the_record() {
    let aggregator = aggregator();
    let record = aggregator
        .events()
        .ingest(&ctx(), json!({ "execution_id": "X", "status": "ringing" }))
        .unwrap();
    assert_eq!(record.source, EventSource::Webhook);
    assert_eq!(record.correlation_id.as_deref(), Some("corr-test"));
}

#[test]
fn unknown_execution_reduces_to_empty_state() {
    let aggregator = aggregator();
    let state = aggregator.executions().get("nope").unwrap();
    assert_eq!(state.execution_id, "nope");
    assert!(state.is_empty());
}

#[test]
fn pagination_contract_over_45_executions() {
    let aggregator = aggregator();
    let ctx = ctx();
    // Execution exec-45 has the newest activity, exec-1 the oldest.
    for n in 1..=45 {
        aggregator
            .events()
            .ingest(
                &ctx,
                json!({
                    "execution_id": format!("exec-{n}"),
                    "status": "completed",
                    "occurred_at": 1000 + n,
                }),
            )
            .unwrap();
    }

    let page = aggregator.executions().list(Some(20), Some(20)).unwrap();
    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next_page);
    assert!(page.has_previous_page);
    assert_eq!(page.items.len(), 20);
    // Ranks 21..=40 by last_activity descending: exec-25 down to exec-6.
    assert_eq!(page.items[0].execution_id, "exec-25");
    assert_eq!(page.items[19].execution_id, "exec-6");
}

#[test]
fn execution_summaries_come_from_the_reducer() {
    let aggregator = aggregator();
    let ctx = ctx();
    aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "X", "status": "ringing", "occurred_at": 100, "to": "+15550100" }),
        )
        .unwrap();
    aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "X", "digits": "2", "occurred_at": 200 }),
        )
        .unwrap();

    let page = aggregator.executions().list(None, None).unwrap();
    assert_eq!(page.items.len(), 1);
    let summary = &page.items[0];
    assert_eq!(summary.status.as_deref(), Some("ringing"));
    assert_eq!(summary.event_count, 2);
    assert_eq!(summary.dtmf_count, 1);
    assert_eq!(summary.to_number.as_deref(), Some("+15550100"));
    assert_eq!(summary.last_activity, Some(200));
}

#[test]
fn window_counts_match_ingested_events() {
    let aggregator = aggregator();
    let ctx = ctx();
    aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "A", "digits": "1", "occurred_at": 100 }),
        )
        .unwrap();
    aggregator
        .events()
        .ingest(
            &ctx,
            json!({ "execution_id": "B", "digits": "2", "occurred_at": 150 }),
        )
        .unwrap();

    let counts = aggregator
        .stats()
        .window(WindowQuery {
            since: 0,
            until: 1_000,
        })
        .unwrap();
    assert_eq!(counts.events, 2);
    assert_eq!(counts.executions, 2);
    assert_eq!(counts.dtmf_events, 2);
    assert_eq!(counts.confirmations, 1);
    assert_eq!(counts.cancellations, 1);
}
