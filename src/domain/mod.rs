//! Domain layer: inventory items and deployment topology.
//!
//! This module contains the server-side domain model: item identity, the
//! item record with its validated draft form, and the topology metadata
//! describing where the server and its database are placed.

pub mod item;
pub mod item_id;
pub mod topology;

pub use item::{Item, ItemDraft, NAME_MAX_CHARS};
pub use item_id::ItemId;
pub use topology::Topology;
