//! Flow options and per-invocation task configuration.

use super::{Context, Map};
use serde::{Deserialize, Serialize};

/// Options threaded alongside the context through a circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowOptions {
    #[serde(default, flatten)]
    entries: Map,
}

impl FlowOptions {
    /// Creates empty flow options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Gets an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Sets an entry.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    /// Returns true if no entries are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration local to one run of a task wrap.
///
/// The input mapper parks the outer context here so the output mapper can
/// merge the inner result back into that same object.
#[derive(Debug, Default)]
pub struct TaskConfig {
    original_context: Option<Context>,
}

impl TaskConfig {
    /// Creates an empty task config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the outer context.
    #[must_use]
    pub fn with_original_context(mut self, ctx: Context) -> Self {
        self.original_context = Some(ctx);
        self
    }

    /// Returns the stored outer context.
    #[must_use]
    pub fn original_context(&self) -> Option<&Context> {
        self.original_context.as_ref()
    }

    /// Removes and returns the stored outer context.
    pub fn take_original_context(&mut self) -> Option<Context> {
        self.original_context.take()
    }
}
