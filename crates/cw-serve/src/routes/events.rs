use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, build_aggregator};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use cw_core::RequestContext;
use cw_events::types::{EventRecord, EventSource};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct EventsQuery {
    after: Option<i64>,
    limit: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(ingest_event).get(list_events))
        .route("/events/subscribe", get(subscribe))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = Value,
    responses((status = 200, body = EventRecord))
)]
pub(crate) async fn ingest_event(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(payload): Json<Value>,
) -> Response {
    let aggregator = match build_aggregator(&state) {
        Ok(aggregator) => aggregator,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let ctx = RequestContext::new(EventSource::Webhook, Some(correlation.0));
    match aggregator.events().ingest(&ctx, payload) {
        Ok(record) => Json(record).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventsQuery),
    responses((status = 200, body = Vec<EventRecord>))
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let aggregator = match build_aggregator(&state) {
        Ok(aggregator) => aggregator,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match aggregator.events().list(query.after, query.limit) {
        Ok(events) => Json(events).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/events/subscribe",
    params(EventsQuery),
    responses((status = 200))
)]
pub(crate) async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    crate::sse::subscribe(state, query.after).await
}
