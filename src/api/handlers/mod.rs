//! HTTP endpoint handlers organized by resource.

pub mod items;
pub mod system;
pub mod ui;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes. Paths are mounted at the root because
/// probes and clients address them there.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(items::routes())
        .merge(system::routes())
        .merge(ui::routes())
}
