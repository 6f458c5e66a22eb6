//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::Topology;
use crate::service::InventoryService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Inventory service for all item logic.
    pub inventory: Arc<InventoryService>,
    /// Placement metadata for `/arch` and the web UI.
    pub topology: Arc<Topology>,
    /// Per-request timeout applied by the HTTP layer.
    pub request_timeout: Duration,
}
