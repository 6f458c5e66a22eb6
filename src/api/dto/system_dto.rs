//! DTOs for health, readiness and architecture endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Response body for `GET /ready`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// `"ready"` or `"not ready"`.
    pub status: &'static str,
    /// `"connected"` or the database error text.
    pub db: String,
}

/// Response body for `GET /arch`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArchResponse {
    /// Both halves of the cross-architecture deployment.
    pub heterogeneous_demo: ArchTopologyDto,
}

/// The application server and database placement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArchTopologyDto {
    /// This pod.
    pub app_server: AppServerDto,
    /// The PostgreSQL primary.
    pub database: DatabaseDto,
}

/// Application server placement.
#[derive(Debug, Serialize, ToSchema)]
pub struct AppServerDto {
    /// Component role.
    pub role: &'static str,
    /// Machine architecture the binary runs on.
    pub architecture: String,
    /// OS, kernel and machine description.
    pub platform: String,
    /// Kubernetes node name.
    pub node: String,
    /// Pod name.
    pub pod: String,
    /// Configured architecture label.
    pub arch_label: String,
}

/// Database placement and reachability.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseDto {
    /// Component role.
    pub role: &'static str,
    /// Configured architecture label.
    pub architecture: String,
    /// Service DNS name.
    pub host: String,
    /// Service port.
    pub port: u16,
    /// Whether the database answered.
    pub connected: bool,
    /// Short server version, or the error text when not connected.
    pub postgres_version: String,
}
