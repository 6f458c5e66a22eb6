//! # hetero-inventory
//!
//! Inventory CRUD service and deployment driver for a cross-architecture
//! demo: the application server runs on one CPU architecture (IBM Power,
//! `ppc64le`) while its PostgreSQL database runs on another (`x86_64`),
//! both inside a single Kubernetes/OpenShift cluster.
//!
//! ## Architecture
//!
//! ```text
//! Clients (curl, browser, kubelet probes)
//!     │
//!     ├── REST + UI handlers (api/)
//!     │
//!     ├── InventoryService (service/)
//!     │
//!     ├── ItemStore (persistence/)
//!     │     ├── PostgreSQL
//!     │     └── in-memory
//!     │
//!     └── Topology (domain/)
//!
//! hetero-deploy
//!     └── Plan → label nodes · apply manifests · poll readiness (deploy/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
