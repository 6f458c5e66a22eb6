//! Browser UI: server-rendered inventory page with form-based CRUD.
//!
//! Every form posts to a `/ui/...` route which performs the change and
//! redirects back to `/` with a flash message in the query string.

use askama::Template;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use super::items::path_id;
use crate::api::dto::{FlashParams, ItemForm};
use crate::app_state::AppState;
use crate::domain::{Item, ItemDraft, ItemId};
use crate::error::AppError;

/// Template wrapper that converts askama templates into HTML responses.
struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                AppError::Internal(format!("failed to render template: {err}")).into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

struct Flash {
    kind: &'static str,
    message: String,
}

impl Flash {
    fn new(kind: FlashKind, message: String) -> Self {
        Self {
            kind: kind.as_str(),
            message,
        }
    }

    fn from_params(params: FlashParams) -> Option<Self> {
        let message = params.msg.filter(|m| !m.is_empty())?;
        let kind = match params.kind.as_deref() {
            Some("error") => FlashKind::Error,
            _ => FlashKind::Success,
        };
        Some(Self::new(kind, message))
    }
}

struct ItemView {
    id: i32,
    name: String,
    description: String,
    created_at: String,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        let created_at = item
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        Self {
            id: item.id.get(),
            name: item.name,
            description: item.description.unwrap_or_default(),
            created_at,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    node_name: String,
    machine: String,
    app_arch_label: String,
    db_arch_label: String,
    db_host: String,
    db_connected: bool,
    db_detail: String,
    flash: Option<Flash>,
    items: Vec<ItemView>,
    count: usize,
    plural: &'static str,
}

/// `GET /` — Inventory page with the placement banner and item table.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<FlashParams>,
) -> impl IntoResponse {
    let mut flash = Flash::from_params(params);
    let database = state.inventory.database_info().await;

    let items: Vec<ItemView> = match state.inventory.list_items().await {
        Ok(items) => items.into_iter().map(ItemView::from).collect(),
        Err(err) => {
            flash = Some(Flash::new(FlashKind::Error, format!("DB Error: {err}")));
            Vec::new()
        }
    };

    let count = items.len();
    let topology = &state.topology;
    HtmlTemplate(IndexTemplate {
        node_name: topology.node_name.clone(),
        machine: topology.machine.clone(),
        app_arch_label: topology.app_arch_label.clone(),
        db_arch_label: topology.db_arch_label.clone(),
        db_host: topology.db_host.clone(),
        db_connected: database.connected,
        db_detail: if database.connected {
            database.detail
        } else {
            String::new()
        },
        flash,
        items,
        count,
        plural: if count == 1 { "" } else { "s" },
    })
}

/// `POST /ui/items` — Create an item from the add form.
pub async fn create_from_form(State(state): State<AppState>, Form(form): Form<ItemForm>) -> Redirect {
    if form.name.trim().is_empty() {
        return flash_redirect(FlashKind::Error, "Item name is required.");
    }

    let result = match ItemDraft::new(&form.name, &form.description) {
        Ok(draft) => state.inventory.create_item(&draft).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(item) => flash_redirect(
            FlashKind::Success,
            &format!("Item '{}' saved to the database (id={}) ✓", item.name, item.id),
        ),
        Err(err) => error_redirect(&err),
    }
}

/// `POST /ui/items/{id}/edit` — Apply the inline edit form.
///
/// # Errors
///
/// Returns [`AppError::RouteNotFound`] for a non-integer ID.
pub async fn edit_from_form(
    State(state): State<AppState>,
    id: Result<Path<ItemId>, PathRejection>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, AppError> {
    let id = path_id(id)?;
    if form.name.trim().is_empty() {
        return Ok(flash_redirect(FlashKind::Error, "Item name cannot be empty."));
    }

    let result = match ItemDraft::new(&form.name, &form.description) {
        Ok(draft) => state.inventory.update_item(id, &draft).await,
        Err(err) => Err(err),
    };

    Ok(match result {
        Ok(_) => flash_redirect(FlashKind::Success, &format!("Item {id} updated ✓")),
        Err(err) => error_redirect(&err),
    })
}

/// `POST /ui/items/{id}/delete` — Delete from the table's delete button.
///
/// # Errors
///
/// Returns [`AppError::RouteNotFound`] for a non-integer ID.
pub async fn delete_from_form(
    State(state): State<AppState>,
    id: Result<Path<ItemId>, PathRejection>,
) -> Result<Redirect, AppError> {
    let id = path_id(id)?;
    Ok(match state.inventory.delete_item(id).await {
        Ok(item) => flash_redirect(
            FlashKind::Success,
            &format!("Item '{}' deleted ✓", item.name),
        ),
        Err(err) => error_redirect(&err),
    })
}

/// Browser UI routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/ui/items", post(create_from_form))
        .route("/ui/items/{id}/edit", post(edit_from_form))
        .route("/ui/items/{id}/delete", post(delete_from_form))
}

fn flash_redirect(kind: FlashKind, message: &str) -> Redirect {
    Redirect::to(&format!(
        "/?msg={}&type={}",
        urlencoding::encode(message),
        kind.as_str()
    ))
}

fn error_redirect(err: &AppError) -> Redirect {
    match err {
        AppError::ItemNotFound(_) | AppError::InvalidRequest(_) => {
            flash_redirect(FlashKind::Error, &format!("{err}."))
        }
        _ => flash_redirect(FlashKind::Error, &format!("Error: {err}")),
    }
}
