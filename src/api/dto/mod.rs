//! Data Transfer Objects for REST request/response serialization.
//!
//! Response shapes are part of the public contract: clients and probes
//! match on field names such as `items`, `count` and `status`.

pub mod item_dto;
pub mod system_dto;

pub use item_dto::*;
pub use system_dto::*;
