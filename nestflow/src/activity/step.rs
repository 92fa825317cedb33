//! A two-ended activity built from a boolean closure.

use super::{Activity, Direction, Invocation, TerminalEvent};
use crate::context::{Context, FlowOptions};
use crate::errors::NestflowError;
use std::fmt::{self, Debug};

/// A step that ends in success when its closure returns `true`.
pub struct Step<F>
where
    F: Fn(&mut Context, &FlowOptions) -> Result<bool, NestflowError> + Send + Sync,
{
    name: String,
    func: F,
    end_events: [TerminalEvent; 2],
}

impl<F> Step<F>
where
    F: Fn(&mut Context, &FlowOptions) -> Result<bool, NestflowError> + Send + Sync,
{
    /// Creates a new step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            end_events: [TerminalEvent::success(), TerminalEvent::failure()],
        }
    }
}

impl<F> Debug for Step<F>
where
    F: Fn(&mut Context, &FlowOptions) -> Result<bool, NestflowError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

impl<F> Activity for Step<F>
where
    F: Fn(&mut Context, &FlowOptions) -> Result<bool, NestflowError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn end_events(&self) -> &[TerminalEvent] {
        &self.end_events
    }

    fn invoke(
        &self,
        _start_at: Direction,
        mut ctx: Context,
        flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError> {
        let passed = (self.func)(&mut ctx, &flow_options)?;
        let event = if passed {
            self.end_events[0].clone()
        } else {
            self.end_events[1].clone()
        };
        Ok(Invocation::new(event, ctx, flow_options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaskError;
    use serde_json::json;

    #[test]
    fn test_step_success() {
        let step = Step::new("process", |ctx: &mut Context, _: &FlowOptions| {
            ctx.set("process", json!(true));
            Ok(true)
        });

        let result = step.invoke(None, Context::new(), FlowOptions::new()).unwrap();
        assert_eq!(result.event, step.end_events()[0]);
        assert_eq!(result.context.get("process"), Some(&json!(true)));
    }

    #[test]
    fn test_step_failure() {
        let step = Step::new("guard", |_: &mut Context, _: &FlowOptions| Ok(false));

        let result = step.invoke(None, Context::new(), FlowOptions::new()).unwrap();
        assert_eq!(result.event, step.end_events()[1]);
    }

    #[test]
    fn test_step_error_propagates() {
        let step = Step::new("broken", |_: &mut Context, _: &FlowOptions| {
            Err(TaskError::new("broken", "database unavailable").into())
        });

        let err = step.invoke(None, Context::new(), FlowOptions::new()).unwrap_err();
        assert!(matches!(err, NestflowError::Task(_)));
    }
}
