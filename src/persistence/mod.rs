//! Persistence layer: item storage behind the [`ItemStore`] trait.
//!
//! The concrete PostgreSQL implementation uses `sqlx::PgPool` for async
//! access; an in-memory implementation backs local runs with persistence
//! disabled and the test suite.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{Item, ItemDraft, ItemId};
use crate::error::AppError;

pub use memory::MemoryItemStore;
pub use postgres::PostgresItemStore;

/// Storage operations for inventory items.
///
/// `get`, `update` and `delete` return `Ok(None)` when no row has the
/// given ID; only infrastructure failures are errors.
#[async_trait]
pub trait ItemStore: Send + Sync + std::fmt::Debug {
    /// Creates the `items` table if it does not exist yet.
    async fn init_schema(&self) -> Result<(), AppError>;

    /// Round-trips a trivial query to prove the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;

    /// Returns the backend's version banner.
    async fn server_version(&self) -> Result<String, AppError>;

    /// Returns all items, newest (highest ID) first.
    async fn list(&self) -> Result<Vec<Item>, AppError>;

    /// Fetches a single item.
    async fn get(&self, id: ItemId) -> Result<Option<Item>, AppError>;

    /// Inserts a new item and returns the stored row.
    async fn create(&self, draft: &ItemDraft) -> Result<Item, AppError>;

    /// Overwrites name and description of an existing item.
    async fn update(&self, id: ItemId, draft: &ItemDraft) -> Result<Option<Item>, AppError>;

    /// Removes an item, returning the row as it was before deletion.
    async fn delete(&self, id: ItemId) -> Result<Option<Item>, AppError>;
}
