use crate::routes::error::map_error;
use crate::{AppState, build_aggregator};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cw_core::types::execution::{ExecutionState, ExecutionSummary};
use cw_core::types::io::Page;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct ExecutionsQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/executions", get(list_executions))
        .route("/executions/{id}", get(get_execution))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/executions",
    params(ExecutionsQuery),
    responses((status = 200, body = Page<ExecutionSummary>))
)]
pub(crate) async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ExecutionsQuery>,
) -> Response {
    let aggregator = match build_aggregator(&state) {
        Ok(aggregator) => aggregator,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match aggregator.executions().list(query.limit, query.offset) {
        Ok(page) => Json(page).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/executions/{id}",
    params(("id" = String, Path, description = "Execution ID")),
    responses((status = 200, body = ExecutionState))
)]
pub(crate) async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let aggregator = match build_aggregator(&state) {
        Ok(aggregator) => aggregator,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match aggregator.executions().get(&id) {
        Ok(execution) => Json(execution).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}
