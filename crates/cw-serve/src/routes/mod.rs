pub mod error;
pub mod events;
pub mod executions;
pub mod health;
pub mod stats;

use crate::middleware::correlation::correlation_middleware;
use crate::middleware::idempotency::IdempotencyLayer;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(events::router(state.clone()))
        .merge(executions::router(state.clone()))
        .merge(stats::router(state.clone()))
        .merge(health::router())
        .merge(openapi::router())
        .layer(IdempotencyLayer::new(state))
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
