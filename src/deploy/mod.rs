//! Deployment driver: places the inventory server and its database on
//! different CPU architectures of one cluster.
//!
//! A [`Plan`] lists the steps (label nodes, apply manifests, wait for
//! readiness) and a [`Deployer`] executes them in order against the
//! Kubernetes API. Every wait is a fixed-interval poll with a hard timeout.

pub mod apply;
pub mod manifest;
pub mod nodes;
pub mod plan;
pub mod runner;
pub mod wait;

pub use plan::{OnTimeout, Plan, Step};
pub use runner::{Deployer, PodPlacement};
pub use wait::{Readiness, WaitOutcome};
