//! Circuit builder with route validation.

use super::runner::{Circuit, CompiledTask, Hop};
use super::Target;
use crate::activity::{Activity, Role, Step, TerminalEvent};
use crate::config::CircuitConfig;
use crate::context::{Context, FlowOptions};
use crate::errors::{ConfigurationError, NestflowError};
use crate::events::EventSink;
use crate::nested::{Composition, TerminalRoleMap};
use crate::wiring::TaskWrap;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

struct PendingTask {
    id: String,
    wrap: TaskWrap,
    roles: TerminalRoleMap,
}

/// Builder for creating validated circuits.
///
/// Tasks run in the order they are added. Unless a route overrides it, a
/// task's `success` role leads to the next task (the `success` end after
/// the last one) and every other role leads to the end declaring that role.
pub struct CircuitBuilder {
    name: String,
    end_events: Vec<TerminalEvent>,
    tasks: Vec<PendingTask>,
    routes: Vec<(String, Role, Target)>,
    config: CircuitConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl CircuitBuilder {
    /// Creates a builder with a `success` and a `failure` end.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            end_events: vec![TerminalEvent::success(), TerminalEvent::failure()],
            tasks: Vec::new(),
            routes: Vec::new(),
            config: CircuitConfig::default(),
            sink: None,
        }
    }

    /// Declares an end event, replacing any end with the same role.
    #[must_use]
    pub fn end(mut self, event: TerminalEvent) -> Self {
        match self
            .end_events
            .iter()
            .position(|end| end.role() == event.role())
        {
            Some(index) => self.end_events[index] = event,
            None => self.end_events.push(event),
        }
        self
    }

    /// Adds a task with the default task wrap.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is taken or the activity has no valid end events.
    pub fn step(
        mut self,
        id: impl Into<String>,
        activity: Arc<dyn Activity>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        let roles = TerminalRoleMap::from_end_events(&id, activity.end_events())?;
        self.push(id, TaskWrap::new(activity), roles)?;
        Ok(self)
    }

    /// Adds a railway step from a boolean closure.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is taken.
    pub fn step_fn<F>(self, id: impl Into<String>, func: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&mut Context, &FlowOptions) -> Result<bool, NestflowError> + Send + Sync + 'static,
    {
        let id = id.into();
        let step = Step::new(id.clone(), func);
        self.step(id, Arc::new(step))
    }

    /// Adds a nested composition under its metadata name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the wiring does not apply.
    pub fn nested(mut self, composition: Composition) -> Result<Self, NestflowError> {
        let Composition {
            task,
            metadata,
            wiring,
            outputs,
        } = composition;

        let mut wrap = TaskWrap::new(task);
        wrap.apply_all(wiring)?;
        debug!(circuit = %self.name, task = %metadata.name, nodes = ?wrap.ids(), "Adding nested task");

        self.push(metadata.name, wrap, outputs)?;
        Ok(self)
    }

    /// Overrides where a role of a task leads.
    #[must_use]
    pub fn route(mut self, task: impl Into<String>, role: impl Into<Role>, target: Target) -> Self {
        self.routes.push((task.into(), role.into(), target));
        self
    }

    /// Sends circuit events to this sink instead of the global one.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the circuit configuration.
    #[must_use]
    pub fn with_config(mut self, config: CircuitConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the circuit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Builds the circuit.
    ///
    /// # Errors
    ///
    /// Returns an error if the circuit is empty or may never invoke a task, a
    /// route names an unknown task, role or target, or some role of some task
    /// has nowhere to go.
    pub fn build(self) -> Result<Circuit, ConfigurationError> {
        if self.tasks.is_empty() {
            return Err(ConfigurationError::empty_circuit(&self.name));
        }
        if self.config.max_task_invocations == 0 {
            return Err(ConfigurationError::zero_invocation_limit(&self.name));
        }

        let mut overrides: Vec<IndexMap<Role, Target>> = vec![IndexMap::new(); self.tasks.len()];
        for (task, role, target) in &self.routes {
            let index = self
                .index_of(task)
                .ok_or_else(|| ConfigurationError::unknown_task(task.as_str()))?;
            if !self.tasks[index].roles.roles().contains(&role) {
                return Err(ConfigurationError::unknown_role(task.as_str(), role.as_str()));
            }
            overrides[index].insert(role.clone(), target.clone());
        }

        let mut compiled = Vec::with_capacity(self.tasks.len());
        for (index, overrides) in overrides.into_iter().enumerate() {
            let task = &self.tasks[index];
            let mut routes = IndexMap::new();
            for role in task.roles.roles() {
                let target = overrides
                    .get(role)
                    .cloned()
                    .unwrap_or_else(|| default_target(role));
                routes.insert(role.clone(), self.resolve(index, role, &target)?);
            }
            compiled.push(routes);
        }

        debug!(
            circuit = %self.name,
            tasks = self.tasks.len(),
            end_events = self.end_events.len(),
            "Built circuit"
        );

        let tasks = self
            .tasks
            .into_iter()
            .zip(compiled)
            .map(|(task, routes)| CompiledTask {
                id: task.id,
                wrap: task.wrap,
                roles: task.roles,
                routes,
            })
            .collect();

        Ok(Circuit {
            name: self.name,
            tasks,
            end_events: self.end_events,
            config: self.config,
            sink: self.sink,
        })
    }

    fn push(
        &mut self,
        id: String,
        wrap: TaskWrap,
        roles: TerminalRoleMap,
    ) -> Result<(), ConfigurationError> {
        if self.index_of(&id).is_some() {
            return Err(ConfigurationError::duplicate_task(id));
        }
        self.tasks.push(PendingTask { id, wrap, roles });
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn end_with_role(&self, role: &Role) -> Option<&TerminalEvent> {
        self.end_events.iter().find(|end| end.role() == role)
    }

    fn resolve(&self, index: usize, role: &Role, target: &Target) -> Result<Hop, ConfigurationError> {
        let task = &self.tasks[index].id;
        match target {
            Target::Next if index + 1 < self.tasks.len() => Ok(Hop::Task(index + 1)),
            Target::Next => self
                .end_with_role(&Role::success())
                .map(|end| Hop::End(end.clone()))
                .ok_or_else(|| ConfigurationError::unroutable_role(task.as_str(), role.as_str())),
            Target::Task(id) => self
                .index_of(id)
                .map(Hop::Task)
                .ok_or_else(|| ConfigurationError::unknown_target(task.as_str(), id)),
            Target::End(end_role) => match self.end_with_role(end_role) {
                Some(end) => Ok(Hop::End(end.clone())),
                None if end_role == role => {
                    Err(ConfigurationError::unroutable_role(task.as_str(), role.as_str()))
                }
                None => Err(ConfigurationError::unknown_target(
                    task.as_str(),
                    &format!("End.{end_role}"),
                )),
            },
        }
    }
}

fn default_target(role: &Role) -> Target {
    if *role == Role::success() {
        Target::Next
    } else {
        Target::End(role.clone())
    }
}

impl std::fmt::Debug for CircuitBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBuilder")
            .field("name", &self.name)
            .field("end_events", &self.end_events)
            .field("tasks", &self.tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedEndActivity;

    fn task(name: &str) -> Arc<dyn Activity> {
        Arc::new(FixedEndActivity::success(name))
    }

    #[test]
    fn test_empty_circuit() {
        let err = CircuitBuilder::new("empty").build().unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-004-EMPTY"));
    }

    #[test]
    fn test_duplicate_task() {
        let err = CircuitBuilder::new("c")
            .step("a", task("a"))
            .unwrap()
            .step("a", task("a"))
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-003-DUPLICATE_TASK"));
    }

    #[test]
    fn test_default_routes() {
        let circuit = CircuitBuilder::new("c")
            .step("a", task("a"))
            .unwrap()
            .step("b", task("b"))
            .unwrap()
            .build()
            .unwrap();

        let a = &circuit.tasks[0];
        assert!(matches!(a.routes.get(&Role::success()), Some(Hop::Task(1))));
        assert!(matches!(a.routes.get(&Role::failure()), Some(Hop::End(end)) if end.role() == &Role::failure()));

        let b = &circuit.tasks[1];
        assert!(matches!(b.routes.get(&Role::success()), Some(Hop::End(end)) if end.role() == &Role::success()));
    }

    #[test]
    fn test_custom_role_needs_an_end() {
        let fast = FixedEndActivity::with_ends(
            "fast",
            vec![TerminalEvent::success(), TerminalEvent::failure(), TerminalEvent::pass_fast()],
            0,
        );

        let err = CircuitBuilder::new("c")
            .step("fast", Arc::new(fast))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-001-UNROUTABLE"));
    }

    #[test]
    fn test_custom_role_with_route() {
        let fast = FixedEndActivity::with_ends(
            "fast",
            vec![TerminalEvent::success(), TerminalEvent::failure(), TerminalEvent::pass_fast()],
            0,
        );

        let circuit = CircuitBuilder::new("c")
            .step("fast", Arc::new(fast))
            .unwrap()
            .route("fast", "pass_fast", Target::Next)
            .build()
            .unwrap();
        assert!(matches!(
            circuit.tasks[0].routes.get(&Role::pass_fast()),
            Some(Hop::End(end)) if end.role() == &Role::success()
        ));
    }

    #[test]
    fn test_route_errors() {
        let err = CircuitBuilder::new("c")
            .step("a", task("a"))
            .unwrap()
            .route("missing", "success", Target::Next)
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-005-UNKNOWN_TASK"));

        let err = CircuitBuilder::new("c")
            .step("a", task("a"))
            .unwrap()
            .route("a", "success", Target::task("nowhere"))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-002-UNKNOWN_TARGET"));

        let err = CircuitBuilder::new("c")
            .step("a", task("a"))
            .unwrap()
            .route("a", "failure", Target::end("pass_fast"))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-002-UNKNOWN_TARGET"));
    }

    #[test]
    fn test_route_for_role_the_task_never_ends_in() {
        let err = CircuitBuilder::new("c")
            .step("validate", Arc::new(FixedEndActivity::failure("validate")))
            .unwrap()
            .step("recover", task("recover"))
            .unwrap()
            .route("validate", "failur", Target::task("recover"))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-006-UNKNOWN_ROLE"));

        let err = CircuitBuilder::new("c")
            .end(TerminalEvent::pass_fast())
            .step("a", task("a"))
            .unwrap()
            .route("a", "pass_fast", Target::Next)
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-006-UNKNOWN_ROLE"));
    }

    #[test]
    fn test_zero_invocation_limit() {
        let err = CircuitBuilder::new("c")
            .with_config(CircuitConfig::default().with_max_task_invocations(0))
            .step("a", task("a"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CIRCUIT-007-NO_INVOCATIONS"));

        let circuit = CircuitBuilder::new("c")
            .with_config(CircuitConfig::default().with_max_task_invocations(1))
            .step("a", task("a"))
            .unwrap()
            .build();
        assert!(circuit.is_ok());
    }

    #[test]
    fn test_end_replaces_same_role() {
        let custom = TerminalEvent::new("ok", Role::success(), crate::activity::EndKind::Success);
        let circuit = CircuitBuilder::new("c")
            .end(custom.clone())
            .end(TerminalEvent::pass_fast())
            .step("a", task("a"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(circuit.end_events().len(), 3);
        assert!(circuit.end_events()[0] == custom);
    }

    #[test]
    fn test_step_without_end_events() {
        let none = FixedEndActivity::with_ends("none", Vec::new(), 0);
        let err = CircuitBuilder::new("c").step("none", Arc::new(none)).unwrap_err();
        assert_eq!(err.code(), Some("NESTED-001-NO_END_EVENTS"));
    }
}
