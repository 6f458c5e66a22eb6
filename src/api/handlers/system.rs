//! System endpoints: liveness, readiness, and architecture report.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    AppServerDto, ArchResponse, ArchTopologyDto, DatabaseDto, HealthResponse, ReadyResponse,
};
use crate::app_state::AppState;

/// `GET /health` — Liveness probe. Never touches the database.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns `ok` while the process is serving requests.",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// `GET /ready` — Readiness probe. Ready only while the database answers.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "System",
    summary = "Readiness check",
    description = "Runs a trivial query against the database.",
    responses(
        (status = 200, description = "Database reachable", body = ReadyResponse),
        (status = 503, description = "Database unreachable", body = ReadyResponse),
    )
)]
pub async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.inventory.readiness().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                db: "connected".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not ready",
                    db: err.to_string(),
                }),
            )
        }
    }
}

/// `GET /arch` — Where the application server and database run.
#[utoipa::path(
    get,
    path = "/arch",
    tag = "System",
    summary = "Cross-architecture report",
    description = "Reports this pod's machine architecture and node next to the database's placement and reachability.",
    responses(
        (status = 200, description = "Placement report", body = ArchResponse),
    )
)]
pub async fn arch_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.inventory.database_info().await;
    let topology = &state.topology;

    Json(ArchResponse {
        heterogeneous_demo: ArchTopologyDto {
            app_server: AppServerDto {
                role: "Application Server + Web UI",
                architecture: topology.machine.clone(),
                platform: topology.platform.clone(),
                node: topology.node_name.clone(),
                pod: topology.pod_name.clone(),
                arch_label: topology.app_arch_label.clone(),
            },
            database: DatabaseDto {
                role: "Database Server (Crunchy PGO)",
                architecture: topology.db_arch_label.clone(),
                host: topology.db_host.clone(),
                port: topology.db_port,
                connected: database.connected,
                postgres_version: database.detail,
            },
        },
    })
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/arch", get(arch_handler))
}
