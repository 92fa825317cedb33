//! Mapping the nested result back into the outer context.

use crate::context::Context;
use crate::errors::{MergeConflictError, NestflowError, WiringError};
use crate::wiring::{WrapFrame, WrapStep};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reconciles the original outer context with the nested result.
#[cfg_attr(test, mockall::automock)]
pub trait MergeStrategy: Send + Sync {
    /// Merges `result` into `original` and returns the outer context.
    fn merge(&self, original: Context, result: Context) -> Result<Context, NestflowError>;
}

/// Copies the nested result's overlay into the original context.
///
/// Only values the nested run wrote come back; its baseline stays behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyMutableToOriginal;

impl MergeStrategy for CopyMutableToOriginal {
    fn merge(&self, mut original: Context, result: Context) -> Result<Context, NestflowError> {
        result.merge_overlay_into(&mut original);
        Ok(original)
    }
}

/// Like [`CopyMutableToOriginal`], but refuses to overwrite a value the
/// original already holds with a different one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetectingMerge;

impl MergeStrategy for ConflictDetectingMerge {
    fn merge(&self, mut original: Context, result: Context) -> Result<Context, NestflowError> {
        let (_, overlay) = result.decompose();
        if let Some((key, _)) = overlay
            .iter()
            .find(|(key, value)| original.get(key).is_some_and(|current| current != *value))
        {
            return Err(MergeConflictError::new(key.clone()).into());
        }
        result.merge_overlay_into(&mut original);
        Ok(original)
    }
}

/// Selects a built-in merge strategy by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategyKind {
    /// [`CopyMutableToOriginal`].
    #[default]
    CopyMutableToOriginal,
    /// [`ConflictDetectingMerge`].
    ConflictDetecting,
}

impl MergeStrategyKind {
    /// Builds the strategy.
    #[must_use]
    pub fn build(self) -> Arc<dyn MergeStrategy> {
        match self {
            Self::CopyMutableToOriginal => Arc::new(CopyMutableToOriginal),
            Self::ConflictDetecting => Arc::new(ConflictDetectingMerge),
        }
    }
}

/// Task wrap step running before the wrap's default end.
#[derive(Clone)]
pub struct OutputMapper {
    id: String,
    strategy: Arc<dyn MergeStrategy>,
}

impl OutputMapper {
    /// Creates an output mapper for the node `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, strategy: Arc<dyn MergeStrategy>) -> Self {
        Self {
            id: id.into(),
            strategy,
        }
    }

    /// Maps one frame.
    ///
    /// # Errors
    ///
    /// Returns `WiringError::MissingOriginalContext` when no input step parked
    /// the outer context, and propagates strategy errors.
    pub fn apply(&self, mut frame: WrapFrame) -> Result<WrapFrame, NestflowError> {
        let original = frame
            .task_config
            .take_original_context()
            .ok_or_else(|| WiringError::MissingOriginalContext {
                node: self.id.clone(),
            })?;

        let written = frame.context.decompose().1.len();
        frame.context = self.strategy.merge(original, frame.context)?;
        debug!(
            node = %self.id,
            outer_context = %frame.context.id(),
            written,
            "nested.output.merged"
        );
        Ok(frame)
    }
}

impl WrapStep for OutputMapper {
    fn call(&self, frame: WrapFrame) -> Result<WrapFrame, NestflowError> {
        self.apply(frame)
    }
}

impl fmt::Debug for OutputMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputMapper")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
