//! HTTP layer: route handlers, DTOs, OpenAPI document and router composition.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete router with all REST and UI endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(openapi::routes())
}

/// Builds the fully layered application ready to be served.
pub fn build_app(state: AppState) -> Router {
    let timeout = state.request_timeout;
    build_router()
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
