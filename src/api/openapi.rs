//! OpenAPI document for the REST surface.
//!
//! With the `swagger-ui` feature the document is served at
//! `/api-docs/openapi.json` together with Swagger UI at `/swagger-ui`.

use axum::Router;
use utoipa::OpenApi;

use crate::api::dto::{
    AppServerDto, ArchResponse, ArchTopologyDto, DatabaseDto, HealthResponse, ItemDto,
    ItemListResponse, ItemRequest, ItemResponse, MessageResponse, ReadyResponse,
};
use crate::api::handlers::{items, system};
use crate::app_state::AppState;
use crate::error::ErrorResponse;

/// OpenAPI description of the inventory API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "hetero-inventory",
        description = "Inventory CRUD service for the cross-architecture demo"
    ),
    paths(
        items::list_items,
        items::create_item,
        items::get_item,
        items::update_item,
        items::delete_item,
        system::health_handler,
        system::ready_handler,
        system::arch_handler,
    ),
    components(schemas(
        ItemDto,
        ItemListResponse,
        ItemRequest,
        ItemResponse,
        MessageResponse,
        HealthResponse,
        ReadyResponse,
        ArchResponse,
        ArchTopologyDto,
        AppServerDto,
        DatabaseDto,
        ErrorResponse,
    )),
    tags(
        (name = "Items", description = "Inventory item CRUD"),
        (name = "System", description = "Probes and placement report"),
    )
)]
pub struct ApiDoc;

/// Documentation routes.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Documentation routes.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    Router::new()
}
