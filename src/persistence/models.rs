//! Database row models.

use chrono::NaiveDateTime;

use crate::domain::{Item, ItemId};

/// A row from the `items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    /// `SERIAL` primary key.
    pub id: i32,
    /// `VARCHAR(255) NOT NULL`.
    pub name: String,
    /// Nullable `TEXT`.
    pub description: Option<String>,
    /// `TIMESTAMP DEFAULT CURRENT_TIMESTAMP`; nullable in the schema.
    pub created_at: Option<NaiveDateTime>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}
