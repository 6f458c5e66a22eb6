//! Item CRUD handlers: list, create, get, update, delete.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::{
    ItemDto, ItemListResponse, ItemRequest, ItemResponse, MessageResponse, body_required,
    name_required,
};
use crate::app_state::AppState;
use crate::domain::ItemId;
use crate::error::{AppError, ErrorResponse};

/// `GET /items` — List all items, newest first.
///
/// # Errors
///
/// Returns [`AppError::Database`] when the store is unavailable.
#[utoipa::path(
    get,
    path = "/items",
    tag = "Items",
    summary = "List items",
    description = "Returns every inventory item, newest first, with the total count.",
    responses(
        (status = 200, description = "All items", body = ItemListResponse),
        (status = 500, description = "Database failure", body = ErrorResponse),
    )
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items: Vec<ItemDto> = state
        .inventory
        .list_items()
        .await?
        .into_iter()
        .map(ItemDto::from)
        .collect();
    let count = items.len();
    Ok(Json(ItemListResponse { items, count }))
}

/// `POST /items` — Create an item.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] on a missing or blank name.
#[utoipa::path(
    post,
    path = "/items",
    tag = "Items",
    summary = "Create an item",
    description = "Creates an item from a JSON object with a required `name` and optional `description`.",
    request_body = ItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Missing or blank name", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse),
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let draft = ItemRequest::from_body(json_body(body))
        .ok_or_else(name_required)?
        .into_create_draft()?;

    let item = state.inventory.create_item(&draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            item: item.into(),
            message: Some("Item created successfully".to_string()),
        }),
    ))
}

/// `GET /items/{id}` — Fetch a single item.
///
/// # Errors
///
/// Returns [`AppError::ItemNotFound`] if the item does not exist.
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "Items",
    summary = "Get an item",
    params(
        ("id" = i32, Path, description = "Item ID"),
    ),
    responses(
        (status = 200, description = "The item", body = ItemResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    id: Result<Path<ItemId>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.inventory.get_item(path_id(id)?).await?;
    Ok(Json(ItemResponse {
        item: item.into(),
        message: None,
    }))
}

/// `PUT /items/{id}` — Replace an item's name and description.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] on a missing body or blank name and
/// [`AppError::ItemNotFound`] if the item does not exist.
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "Items",
    summary = "Update an item",
    params(
        ("id" = i32, Path, description = "Item ID"),
    ),
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Missing body or blank name", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    id: Result<Path<ItemId>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    let draft = ItemRequest::from_body(json_body(body))
        .ok_or_else(body_required)?
        .into_update_draft()?;

    let item = state.inventory.update_item(id, &draft).await?;

    Ok(Json(ItemResponse {
        item: item.into(),
        message: Some("Item updated successfully".to_string()),
    }))
}

/// `DELETE /items/{id}` — Remove an item.
///
/// # Errors
///
/// Returns [`AppError::ItemNotFound`] if the item does not exist.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "Items",
    summary = "Delete an item",
    params(
        ("id" = i32, Path, description = "Item ID"),
    ),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    id: Result<Path<ItemId>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    state.inventory.delete_item(id).await?;
    Ok(Json(MessageResponse {
        message: format!("Item {id} deleted"),
    }))
}

/// Item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

/// Treats any unparsable or non-JSON body as absent.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Option<Value> {
    body.ok().map(|Json(value)| value)
}

/// Non-integer IDs do not name a resource.
pub(crate) fn path_id(id: Result<Path<ItemId>, PathRejection>) -> Result<ItemId, AppError> {
    id.map(|Path(id)| id).map_err(|_| AppError::RouteNotFound)
}
