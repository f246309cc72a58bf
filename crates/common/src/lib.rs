//! Common types shared across switchboard crates.
//!
//! This crate holds the provider enumeration, the plan/result data model
//! and the error taxonomy so that the client layer and the coordinator can
//! both reference them without circular dependencies.

pub mod error;
pub mod provider;
pub mod task;

pub use error::{Result, SwitchboardError};
pub use provider::Provider;
pub use task::{
    ExecutionPlan, RoutingPlanItem, RunResult, SubRequest, SubResult, TaskCategory,
};
