pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sse;

use axum::Router;
use axum::http::Request;
use cw_core::Aggregator;
use cw_core::error::{CallwatchError, StoreError};
use cw_db::schema;
use cw_db::store::DbStore;
use cw_events::bus::EventBus;
use cw_provider::CallProvider;
use middleware::correlation::CorrelationId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify};

#[derive(Clone)]
pub struct IdempotencyLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl IdempotencyLocks {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for IdempotencyLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_path: String,
    pub event_bus: EventBus,
    pub idempotency: IdempotencyLocks,
    pub provider: Arc<dyn CallProvider>,
}

pub fn build_aggregator(state: &AppState) -> Result<Aggregator<DbStore>, CallwatchError> {
    let conn = schema::open_and_migrate(&state.db_path).map_err(|err| {
        CallwatchError::Store(StoreError::Unavailable {
            message: err.to_string(),
        })
    })?;
    Ok(Aggregator::new(DbStore::new(conn), state.event_bus.clone()))
}

pub fn cleanup_idempotency(state: &AppState) -> Result<u64, CallwatchError> {
    let aggregator = build_aggregator(state)?;
    let store = cw_db::idempotency::IdempotencyStore::new(aggregator.store().connection());
    store
        .cleanup(chrono::Utc::now())
        .map_err(CallwatchError::from)
}

pub fn correlation_id_from_request<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<CorrelationId>()
        .map(|value| value.0.clone())
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "callwatch listening");
    axum::serve(listener, app(state)).await
}
