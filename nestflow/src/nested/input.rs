//! Mapping the outer context into the nested activity.

use crate::context::{Context, FlowOptions};
use crate::errors::NestflowError;
use crate::wiring::{WrapFrame, WrapStep};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Derives the inner context from the outer context and original flow options.
pub type Derivation = Arc<dyn Fn(&Context, &FlowOptions) -> Context + Send + Sync>;

/// Task wrap step running before the nested task.
///
/// Hands the derived context to the task and parks the outer context in the
/// task config under `original_context`.
#[derive(Clone)]
pub struct InputMapper {
    derive: Derivation,
}

impl InputMapper {
    /// Creates a mapper from a derivation function.
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn(&Context, &FlowOptions) -> Context + Send + Sync + 'static,
    {
        Self {
            derive: Arc::new(derive),
        }
    }

    /// Creates a mapper from a shared derivation.
    #[must_use]
    pub fn from_derivation(derive: Derivation) -> Self {
        Self { derive }
    }

    /// The inner activity sees the outer state as its baseline.
    #[must_use]
    pub fn scoped() -> Self {
        Self::new(|ctx: &Context, _: &FlowOptions| ctx.wrap())
    }

    /// Maps one frame.
    #[must_use]
    pub fn apply(&self, frame: WrapFrame) -> WrapFrame {
        let WrapFrame {
            direction,
            context,
            flow_options,
            task_config,
            original_flow_options,
        } = frame;

        let inner = (self.derive)(&context, &original_flow_options);
        debug!(
            outer_context = %context.id(),
            inner_context = %inner.id(),
            inner_keys = inner.len(),
            "nested.input.mapped"
        );

        WrapFrame {
            direction,
            context: inner,
            flow_options,
            task_config: task_config.with_original_context(context),
            original_flow_options,
        }
    }
}

impl WrapStep for InputMapper {
    fn call(&self, frame: WrapFrame) -> Result<WrapFrame, NestflowError> {
        Ok(self.apply(frame))
    }
}

impl fmt::Debug for InputMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputMapper").finish_non_exhaustive()
    }
}
