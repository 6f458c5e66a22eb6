//! PostgreSQL implementation of the item store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::ItemStore;
use super::models::ItemRow;
use crate::config::AppConfig;
use crate::domain::{Item, ItemDraft, ItemId};
use crate::error::AppError;

/// PostgreSQL-backed item store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily-connecting pool from configuration.
    ///
    /// No connection is opened until the first query, so the server can
    /// start while the database is still being provisioned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if the connection URL is malformed.
    pub fn connect_lazy(config: &AppConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_lazy(&config.database_url)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn server_version(&self) -> Result<String, AppError> {
        let version = sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    async fn list(&self) -> Result<Vec<Item>, AppError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, created_at FROM items ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, created_at FROM items WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn create(&self, draft: &ItemDraft) -> Result<Item, AppError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "INSERT INTO items (name, description) VALUES ($1, $2) \
             RETURNING id, name, description, created_at",
        )
        .bind(draft.name())
        .bind(draft.description())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> Result<Option<Item>, AppError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "UPDATE items SET name = $1, description = $2 WHERE id = $3 \
             RETURNING id, name, description, created_at",
        )
        .bind(draft.name())
        .bind(draft.description())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn delete(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "DELETE FROM items WHERE id = $1 RETURNING id, name, description, created_at",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }
}
