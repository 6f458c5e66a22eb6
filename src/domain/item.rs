//! Inventory item record and its validated input form.

use chrono::NaiveDateTime;

use super::ItemId;
use crate::error::AppError;

/// Maximum length of an item name, matching the `VARCHAR(255)` column.
pub const NAME_MAX_CHARS: usize = 255;

/// A stored inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Database-assigned identifier.
    pub id: ItemId,
    /// Item name (never blank).
    pub name: String,
    /// Free-form description. `NULL` rows written by other clients are `None`.
    pub description: Option<String>,
    /// Server-side insertion time (`TIMESTAMP` without time zone).
    pub created_at: Option<NaiveDateTime>,
}

impl Item {
    /// Renders `created_at` as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    #[must_use]
    pub fn created_at_text(&self) -> Option<String> {
        self.created_at.map(|ts| ts.to_string())
    }
}

/// Validated name/description pair used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    name: String,
    description: String,
}

impl ItemDraft {
    /// Trims both fields and validates the name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRequest`] if the trimmed name is blank or
    /// longer than [`NAME_MAX_CHARS`] characters.
    pub fn new(name: &str, description: &str) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidRequest(
                "Field 'name' must not be blank".to_string(),
            ));
        }
        if name.chars().count() > NAME_MAX_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "Field 'name' must be at most {NAME_MAX_CHARS} characters"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            description: description.trim().to_string(),
        })
    }

    /// Validated item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed description; empty when none was given.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
