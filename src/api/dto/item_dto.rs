//! Item DTOs for list, get, create, update and delete.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Item, ItemDraft};
use crate::error::AppError;

/// Item as rendered in JSON responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDto {
    /// Database-assigned identifier.
    pub id: i32,
    /// Item name.
    pub name: String,
    /// Description; `null` for rows stored without one.
    pub description: Option<String>,
    /// Insertion time as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    pub created_at: Option<String>,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        let created_at = item.created_at_text();
        Self {
            id: item.id.get(),
            name: item.name,
            description: item.description,
            created_at,
        }
    }
}

/// Response body for `GET /items`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemListResponse {
    /// Items, newest first.
    pub items: Vec<ItemDto>,
    /// Number of items returned.
    pub count: usize,
}

/// Response body carrying a single item, with an optional status message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    /// The item.
    pub item: ItemDto,
    /// Present on create and update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body for `DELETE /items/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Request body for `POST /items` and `PUT /items/{id}`.
///
/// Values are accepted loosely: strings are used as-is, other JSON scalars
/// are converted to their JSON text, and `null` counts as absent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ItemRequest {
    /// Item name (required, must not be blank).
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
    /// Optional description.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Option<Value>,
}

impl ItemRequest {
    /// Interprets a raw body. Only a non-empty JSON object yields a request.
    #[must_use]
    pub fn from_body(body: Option<Value>) -> Option<Self> {
        match body {
            Some(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map)).ok()
            }
            _ => None,
        }
    }

    /// Validates a create request: `name` must be present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] on a missing or blank name.
    pub fn into_create_draft(self) -> Result<ItemDraft, AppError> {
        let name = self.name.as_ref().ok_or_else(name_required)?;
        ItemDraft::new(&field_text(name), &self.description_text())
    }

    /// Validates an update request: a missing name counts as blank.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] on a blank name.
    pub fn into_update_draft(self) -> Result<ItemDraft, AppError> {
        let name = self.name.as_ref().map(field_text).unwrap_or_default();
        ItemDraft::new(&name, &self.description_text())
    }

    fn description_text(&self) -> String {
        self.description.as_ref().map(field_text).unwrap_or_default()
    }
}

/// Error for a create request without a usable `name`.
#[must_use]
pub fn name_required() -> AppError {
    AppError::InvalidRequest("Field 'name' is required".to_string())
}

/// Error for an update request without a usable JSON body.
#[must_use]
pub fn body_required() -> AppError {
    AppError::InvalidRequest("JSON body required".to_string())
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Form body posted by the web UI create and edit forms.
#[derive(Debug, Default, Deserialize)]
pub struct ItemForm {
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Query parameters carrying a flash message back to the UI index page.
#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    /// Message text.
    pub msg: Option<String>,
    /// `success` or `error`; anything else renders as `success`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
