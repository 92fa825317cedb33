//! Context management for activity invocations.
//!
//! This module provides:
//! - The baseline/overlay [`Context`] threaded through every invocation
//! - Flow options carried alongside the context
//! - Task config used by task wrap steps to pass state across a nested call

#[cfg(test)]
mod context_tests;
mod options;
mod store;

pub use options::{FlowOptions, TaskConfig};
pub use store::{Context, Map};
