use utoipa::OpenApi;

use crate::routes::events::EventsQuery;
use crate::routes::executions::ExecutionsQuery;
use crate::routes::health::Health;
use crate::routes::stats::{DailyQuery, MonthlyQuery};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cw_core::types::execution::{DtmfEntry, ExecutionState, ExecutionSummary};
use cw_core::types::io::{Page, WindowQuery};
use cw_core::types::stats::{
    CallStats, DailySummary, DayRow, InboundStats, OutboundStats, OverallStats, PeriodStats,
    WindowCounts,
};
use cw_events::types::{DtmfAction, EventKind, EventRecord, EventSource};
use cw_provider::{CallDirection, CallRecord};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::events::ingest_event,
        crate::routes::events::list_events,
        crate::routes::events::subscribe,
        crate::routes::executions::list_executions,
        crate::routes::executions::get_execution,
        crate::routes::stats::window_counts,
        crate::routes::stats::daily,
        crate::routes::stats::monthly,
        crate::routes::health::health
    ),
    components(schemas(
        EventRecord,
        EventKind,
        EventSource,
        DtmfAction,
        DtmfEntry,
        ExecutionState,
        ExecutionSummary,
        Page<ExecutionSummary>,
        WindowQuery,
        WindowCounts,
        CallStats,
        InboundStats,
        OutboundStats,
        OverallStats,
        DailySummary,
        DayRow,
        PeriodStats,
        CallRecord,
        CallDirection,
        EventsQuery,
        ExecutionsQuery,
        DailyQuery,
        MonthlyQuery,
        Health
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn ensure_initialized() {
    let _ = ApiDoc::openapi();
}

pub fn router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> impl IntoResponse {
    let html = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Callwatch API Docs</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: '/api/openapi.json', dom_id: '#swagger-ui' });
    </script>
  </body>
</html>
"#;
    (axum::http::StatusCode::OK, axum::response::Html(html))
}
