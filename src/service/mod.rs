//! Service layer: business logic orchestration.
//!
//! [`InventoryService`] validates requests, delegates storage to an
//! [`crate::persistence::ItemStore`], and logs every mutation.

pub mod inventory_service;

pub use inventory_service::{DatabaseInfo, InventoryService};
