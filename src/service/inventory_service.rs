//! Inventory service: orchestrates item operations over an [`ItemStore`].

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Item, ItemDraft, ItemId};
use crate::error::AppError;
use crate::persistence::ItemStore;

/// Longest database detail string surfaced to clients.
const DETAIL_MAX_CHARS: usize = 80;

/// Database reachability as shown by `/arch` and the web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    /// Whether `SELECT version()` succeeded.
    pub connected: bool,
    /// Short server version when connected, truncated error text otherwise.
    pub detail: String,
}

/// Orchestration layer for all item operations.
///
/// Stateless coordinator: owns a shared [`ItemStore`] and turns missing
/// rows into [`AppError::ItemNotFound`].
#[derive(Debug, Clone)]
pub struct InventoryService {
    store: Arc<dyn ItemStore>,
}

impl InventoryService {
    /// Creates a new `InventoryService`.
    #[must_use]
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Initializes the schema, retrying with a fixed delay.
    ///
    /// # Errors
    ///
    /// Returns the last [`AppError`] once `attempts` tries have failed.
    pub async fn initialize(&self, attempts: u32, delay: Duration) -> Result<(), AppError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.store.init_schema().await {
                Ok(()) => {
                    tracing::info!(attempt, "database schema initialized");
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        retry_in_secs = delay.as_secs(),
                        error = %err,
                        "database initialization failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "could not initialize database");
                    return Err(err);
                }
            }
        }
    }

    /// Runs [`initialize`](Self::initialize) on a spawned task so the caller
    /// can start serving immediately. A final failure is logged.
    pub fn initialize_in_background(
        self: &Arc<Self>,
        attempts: u32,
        delay: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = service.initialize(attempts, delay).await {
                tracing::warn!(error = %err, "serving without an initialized schema");
            }
        })
    }

    /// Returns all items, newest first.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] if the store is unavailable.
    pub async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        self.store.list().await
    }

    /// Fetches a single item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ItemNotFound`] if no item has the given ID.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, AppError> {
        self.store.get(id).await?.ok_or(AppError::ItemNotFound(id))
    }

    /// Stores a new item.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] if the store rejects the insert.
    pub async fn create_item(&self, draft: &ItemDraft) -> Result<Item, AppError> {
        let item = self.store.create(draft).await?;
        tracing::info!(item_id = %item.id, name = %item.name, "item created");
        Ok(item)
    }

    /// Replaces name and description of an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ItemNotFound`] if no item has the given ID.
    pub async fn update_item(&self, id: ItemId, draft: &ItemDraft) -> Result<Item, AppError> {
        let item = self
            .store
            .update(id, draft)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;
        tracing::info!(item_id = %id, name = %item.name, "item updated");
        Ok(item)
    }

    /// Deletes an item and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ItemNotFound`] if no item has the given ID.
    pub async fn delete_item(&self, id: ItemId) -> Result<Item, AppError> {
        let item = self
            .store
            .delete(id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;
        tracing::info!(item_id = %id, name = %item.name, "item deleted");
        Ok(item)
    }

    /// Checks that the store answers queries.
    ///
    /// # Errors
    ///
    /// Returns the store's [`AppError`] when it is unreachable.
    pub async fn readiness(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    /// Reports database reachability and version. Never fails.
    pub async fn database_info(&self) -> DatabaseInfo {
        match self.store.server_version().await {
            Ok(version) => DatabaseInfo {
                connected: true,
                detail: short_version(&version).to_string(),
            },
            Err(err) => DatabaseInfo {
                connected: false,
                detail: truncate_chars(&err.to_string(), DETAIL_MAX_CHARS),
            },
        }
    }
}

/// `PostgreSQL 16.4 on x86_64-pc-linux-gnu, compiled by ...` → the part
/// before the first comma.
fn short_version(version: &str) -> &str {
    version.split(',').next().unwrap_or(version).trim()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
