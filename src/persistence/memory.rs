//! In-memory item store.
//!
//! Keeps items in a `BTreeMap` behind a [`tokio::sync::RwLock`]. Used when
//! `PERSISTENCE_ENABLED=false` and by the test suite. Data is lost when the
//! store is dropped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::ItemStore;
use crate::domain::{Item, ItemDraft, ItemId};
use crate::error::AppError;

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<ItemId, Item>,
    last_id: i32,
}

/// Item store that lives entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    inner: RwLock<Inner>,
}

impl MemoryItemStore {
    /// Creates an empty store. IDs start at 1 like a fresh `SERIAL`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn init_schema(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn server_version(&self) -> Result<String, AppError> {
        Ok(format!("in-memory store ({})", env!("CARGO_PKG_NAME")))
    }

    async fn list(&self) -> Result<Vec<Item>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.items.values().rev().cloned().collect())
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        Ok(self.inner.read().await.items.get(&id).cloned())
    }

    async fn create(&self, draft: &ItemDraft) -> Result<Item, AppError> {
        let mut inner = self.inner.write().await;
        let next = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::Database("item id sequence exhausted".to_string()))?;
        inner.last_id = next;

        let item = Item {
            id: ItemId::new(next),
            name: draft.name().to_string(),
            description: Some(draft.description().to_string()),
            created_at: Some(Utc::now().naive_utc()),
        };
        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> Result<Option<Item>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.items.get_mut(&id).map(|item| {
            item.name = draft.name().to_string();
            item.description = Some(draft.description().to_string());
            item.clone()
        }))
    }

    async fn delete(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        Ok(self.inner.write().await.items.remove(&id))
    }
}
