//! Mock activities for testing.

use crate::activity::{Activity, Direction, Invocation, TerminalEvent};
use crate::context::{Context, FlowOptions, Map};
use crate::errors::{NestflowError, TaskError};
use parking_lot::Mutex;

/// An activity that always finishes in the same end event.
///
/// Optionally writes a fixed set of values into the context overlay first.
#[derive(Debug)]
pub struct FixedEndActivity {
    name: String,
    end_events: Vec<TerminalEvent>,
    end_index: usize,
    writes: Map,
    nestable: bool,
    lineage: Vec<&'static str>,
}

impl FixedEndActivity {
    /// Creates an activity with the given ends, finishing in `ends[end_index]`.
    ///
    /// An out-of-range index makes `invoke` report an end event the activity
    /// never declared.
    #[must_use]
    pub fn with_ends(name: impl Into<String>, end_events: Vec<TerminalEvent>, end_index: usize) -> Self {
        Self {
            name: name.into(),
            end_events,
            end_index,
            writes: Map::new(),
            nestable: false,
            lineage: Vec::new(),
        }
    }

    /// Creates a success/failure activity that succeeds.
    #[must_use]
    pub fn success(name: impl Into<String>) -> Self {
        Self::with_ends(name, vec![TerminalEvent::success(), TerminalEvent::failure()], 0)
    }

    /// Creates a success/failure activity that fails.
    #[must_use]
    pub fn failure(name: impl Into<String>) -> Self {
        Self::with_ends(name, vec![TerminalEvent::success(), TerminalEvent::failure()], 1)
    }

    /// Writes a value into the context overlay on every invocation.
    #[must_use]
    pub fn writing(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.writes.insert(key.into(), value);
        self
    }

    /// Marks the activity as natively nestable.
    #[must_use]
    pub fn nestable(mut self) -> Self {
        self.nestable = true;
        self
    }

    /// Declares a compatible base.
    #[must_use]
    pub fn with_lineage(mut self, base: &'static str) -> Self {
        self.lineage.push(base);
        self
    }
}

impl Activity for FixedEndActivity {
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
        for (key, value) in &self.writes {
            ctx.set(key.clone(), value.clone());
        }
        let event = self
            .end_events
            .get(self.end_index)
            .cloned()
            .unwrap_or_else(|| TerminalEvent::custom("undeclared"));
        Ok(Invocation::new(event, ctx, flow_options))
    }

    fn is_nestable(&self) -> bool {
        self.nestable
    }

    fn lineage(&self) -> &[&'static str] {
        &self.lineage
    }
}

/// An activity that records the context it was invoked with.
#[derive(Debug)]
pub struct RecordingActivity {
    inner: FixedEndActivity,
    seen: Mutex<Vec<(uuid::Uuid, Map)>>,
}

impl RecordingActivity {
    /// Wraps an activity and records its inputs.
    #[must_use]
    pub fn new(inner: FixedEndActivity) -> Self {
        Self {
            inner,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the flattened contexts seen so far.
    #[must_use]
    pub fn seen(&self) -> Vec<Map> {
        self.seen.lock().iter().map(|(_, map)| map.clone()).collect()
    }

    /// Returns the identities of the contexts seen so far.
    #[must_use]
    pub fn seen_ids(&self) -> Vec<uuid::Uuid> {
        self.seen.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Returns the number of invocations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Activity for RecordingActivity {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn end_events(&self) -> &[TerminalEvent] {
        self.inner.end_events()
    }

    fn invoke(
        &self,
        start_at: Direction,
        ctx: Context,
        flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError> {
        self.seen.lock().push((ctx.id(), ctx.to_map()));
        self.inner.invoke(start_at, ctx, flow_options)
    }

    fn is_nestable(&self) -> bool {
        self.inner.is_nestable()
    }
}

/// An activity whose invocation always fails with a `TaskError`.
#[derive(Debug)]
pub struct FailingActivity {
    name: String,
    message: String,
    end_events: [TerminalEvent; 2],
}

impl FailingActivity {
    /// Creates a failing activity.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            end_events: [TerminalEvent::success(), TerminalEvent::failure()],
        }
    }
}

impl Activity for FailingActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn end_events(&self) -> &[TerminalEvent] {
        &self.end_events
    }

    fn invoke(
        &self,
        _start_at: Direction,
        _ctx: Context,
        _flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError> {
        Err(TaskError::new(&self.name, &self.message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_end_writes_overlay() {
        let activity = FixedEndActivity::success("inner").writing("x", json!(5));
        let result = activity
            .invoke(None, Context::from_pairs([("x", json!(0))]), FlowOptions::new())
            .unwrap();

        let (base, overlay) = result.context.decompose();
        assert_eq!(base.get("x"), Some(&json!(0)));
        assert_eq!(overlay.get("x"), Some(&json!(5)));
        assert_eq!(result.event, activity.end_events()[0]);
    }

    #[test]
    fn test_recording_activity() {
        let activity = RecordingActivity::new(FixedEndActivity::failure("inner"));
        let ctx = Context::from_pairs([("a", json!(1))]);
        let id = ctx.id();

        activity.invoke(None, ctx, FlowOptions::new()).unwrap();

        assert_eq!(activity.call_count(), 1);
        assert_eq!(activity.seen_ids(), vec![id]);
        assert_eq!(activity.seen()[0].get("a"), Some(&json!(1)));
    }
}
