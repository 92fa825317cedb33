//! Adapter normalizing non-nestable operands to a success/failure activity.

use super::{Activity, Direction, Invocation, TerminalEvent};
use crate::context::{Context, FlowOptions};
use crate::errors::NestflowError;
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::trace;

/// Evaluates `(context, flow_options)` to the activity that should run.
pub trait Resolve: Send + Sync {
    /// Resolves the activity for this invocation.
    fn resolve(
        &self,
        ctx: &Context,
        flow_options: &FlowOptions,
    ) -> Result<Arc<dyn Activity>, NestflowError>;
}

impl<F> Resolve for F
where
    F: Fn(&Context, &FlowOptions) -> Result<Arc<dyn Activity>, NestflowError> + Send + Sync,
{
    fn resolve(
        &self,
        ctx: &Context,
        flow_options: &FlowOptions,
    ) -> Result<Arc<dyn Activity>, NestflowError> {
        self(ctx, flow_options)
    }
}

/// Something that can be nested: an activity, or a resolver picking one per call.
#[derive(Clone)]
pub enum Operand {
    /// An activity known at composition time.
    Activity(Arc<dyn Activity>),
    /// A resolver evaluated on every invocation.
    Dynamic {
        /// Display name used for the composition.
        name: String,
        /// The resolver.
        resolver: Arc<dyn Resolve>,
    },
}

impl Operand {
    /// Wraps an activity.
    pub fn activity(activity: impl Activity + 'static) -> Self {
        Self::Activity(Arc::new(activity))
    }

    /// Wraps a resolver closure.
    pub fn dynamic<F>(name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Context, &FlowOptions) -> Result<Arc<dyn Activity>, NestflowError>
            + Send
            + Sync
            + 'static,
    {
        Self::Dynamic {
            name: name.into(),
            resolver: Arc::new(resolver),
        }
    }

    /// Returns the operand's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Activity(activity) => activity.name(),
            Self::Dynamic { name, .. } => name,
        }
    }

    fn resolve(
        &self,
        ctx: &Context,
        flow_options: &FlowOptions,
    ) -> Result<Arc<dyn Activity>, NestflowError> {
        match self {
            Self::Activity(activity) => Ok(Arc::clone(activity)),
            Self::Dynamic { resolver, .. } => resolver.resolve(ctx, flow_options),
        }
    }
}

impl From<Arc<dyn Activity>> for Operand {
    fn from(activity: Arc<dyn Activity>) -> Self {
        Self::Activity(activity)
    }
}

impl Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activity(activity) => f.debug_tuple("Activity").field(activity).finish(),
            Self::Dynamic { name, .. } => f.debug_struct("Dynamic").field("name", name).finish(),
        }
    }
}

/// Wraps an operand lacking a multi-terminal interface.
///
/// The adapter only knows success and failure. Whatever end the genuine
/// activity reports is collapsed onto those two, so finer distinctions such
/// as `pass_fast` are lost.
#[derive(Debug)]
pub struct NonActivity {
    operand: Operand,
    end_events: [TerminalEvent; 2],
}

impl NonActivity {
    /// Creates a new adapter.
    #[must_use]
    pub fn new(operand: Operand) -> Self {
        Self {
            operand,
            end_events: [TerminalEvent::success(), TerminalEvent::failure()],
        }
    }
}

impl Activity for NonActivity {
    fn name(&self) -> &str {
        self.operand.name()
    }

    fn end_events(&self) -> &[TerminalEvent] {
        &self.end_events
    }

    fn invoke(
        &self,
        start_at: Direction,
        ctx: Context,
        flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError> {
        let activity = self.operand.resolve(&ctx, &flow_options)?;
        let genuine = activity.invoke(start_at, ctx, flow_options)?;

        let index = usize::from(!genuine.event.is_success());
        trace!(
            operand = %self.operand.name(),
            genuine_end = %genuine.event.name(),
            adapted_end = %self.end_events[index].name(),
            "Adapted nested end event"
        );

        Ok(Invocation::new(
            self.end_events[index].clone(),
            genuine.context,
            genuine.flow_options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaskError;
    use crate::testing::{FailingActivity, FixedEndActivity};

    fn invoke(adapter: &NonActivity) -> Result<Invocation, NestflowError> {
        adapter.invoke(None, Context::new(), FlowOptions::new())
    }

    #[test]
    fn test_end_events_are_success_then_failure() {
        let adapter = NonActivity::new(Operand::activity(FixedEndActivity::success("inner")));
        let ends = adapter.end_events();

        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0].name(), "success");
        assert_eq!(ends[1].name(), "failure");
    }

    #[test]
    fn test_success_maps_to_first_end() {
        let adapter = NonActivity::new(Operand::activity(FixedEndActivity::success("inner")));
        let result = invoke(&adapter).unwrap();
        assert_eq!(result.event, adapter.end_events()[0]);
    }

    #[test]
    fn test_pass_fast_maps_to_failure() {
        let inner = FixedEndActivity::with_ends(
            "inner",
            vec![
                TerminalEvent::success(),
                TerminalEvent::failure(),
                TerminalEvent::pass_fast(),
            ],
            2,
        );
        let adapter = NonActivity::new(Operand::activity(inner));

        let result = invoke(&adapter).unwrap();
        assert_eq!(result.event, adapter.end_events()[1]);
    }

    #[test]
    fn test_dynamic_operand_is_resolved_per_call() {
        let operand = Operand::dynamic("pick", |ctx: &Context, _: &FlowOptions| {
            let activity: Arc<dyn Activity> = if ctx.get("ok").is_some() {
                Arc::new(FixedEndActivity::success("yes"))
            } else {
                Arc::new(FixedEndActivity::failure("no"))
            };
            Ok(activity)
        });
        let adapter = NonActivity::new(operand);
        assert_eq!(adapter.name(), "pick");

        let failed = invoke(&adapter).unwrap();
        assert_eq!(failed.event, adapter.end_events()[1]);

        let ctx = Context::from_pairs([("ok", serde_json::json!(true))]);
        let passed = adapter.invoke(None, ctx, FlowOptions::new()).unwrap();
        assert_eq!(passed.event, adapter.end_events()[0]);
    }

    #[test]
    fn test_inner_error_propagates() {
        let adapter = NonActivity::new(Operand::activity(FailingActivity::new("inner", "boom")));
        let err = invoke(&adapter).unwrap_err();

        match err {
            NestflowError::Task(TaskError { task, message }) => {
                assert_eq!(task, "inner");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolver_error_propagates() {
        let operand = Operand::dynamic("broken", |_: &Context, _: &FlowOptions| {
            Err(TaskError::new("broken", "cannot resolve").into())
        });
        let err = invoke(&NonActivity::new(operand)).unwrap_err();
        assert!(matches!(err, NestflowError::Task(_)));
    }
}
