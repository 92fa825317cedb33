//! Running a compiled circuit.

use crate::activity::{Activity, Direction, Invocation, Role, TerminalEvent};
use crate::config::CircuitConfig;
use crate::context::{Context, FlowOptions};
use crate::errors::{ConfigurationError, NestflowError, WiringError};
use crate::events::{get_event_sink, EventSink};
use crate::nested::{TerminalRoleMap, OPERATION_BASE};
use crate::observability::{SpanTimer, TaskSpanAttributes};
use crate::wiring::{TaskWrap, WrapFrame};
use indexmap::IndexMap;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LINEAGE: &[&str] = &[OPERATION_BASE];

/// A resolved route.
#[derive(Debug, Clone)]
pub(super) enum Hop {
    Task(usize),
    End(TerminalEvent),
}

#[derive(Debug)]
pub(super) struct CompiledTask {
    pub(super) id: String,
    pub(super) wrap: TaskWrap,
    pub(super) roles: TerminalRoleMap,
    pub(super) routes: IndexMap<Role, Hop>,
}

/// A validated sequence of tasks with role-based routing.
pub struct Circuit {
    pub(super) name: String,
    pub(super) tasks: Vec<CompiledTask>,
    pub(super) end_events: Vec<TerminalEvent>,
    pub(super) config: CircuitConfig,
    pub(super) sink: Option<Arc<dyn EventSink>>,
}

impl Circuit {
    /// Runs the circuit with empty flow options.
    ///
    /// # Errors
    ///
    /// Propagates task, wiring and merge errors unchanged.
    pub fn call(&self, ctx: Context) -> Result<Invocation, NestflowError> {
        self.invoke(None, ctx, FlowOptions::new())
    }

    /// Returns the task ids in declaration order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.id.as_str()).collect()
    }

    /// Returns the task wrap of a task.
    #[must_use]
    pub fn task_wrap(&self, id: &str) -> Option<&TaskWrap> {
        self.tasks.iter().find(|task| task.id == id).map(|task| &task.wrap)
    }

    fn sink(&self) -> Option<Arc<dyn EventSink>> {
        if !self.config.emit_events {
            return None;
        }
        Some(self.sink.clone().unwrap_or_else(get_event_sink))
    }

    fn run_task(
        &self,
        task: &CompiledTask,
        ctx: Context,
        flow_options: FlowOptions,
        sink: Option<&dyn EventSink>,
    ) -> Result<(TerminalEvent, WrapFrame), NestflowError> {
        let timer = SpanTimer::start();
        if let Some(sink) = sink {
            sink.emit(
                "circuit.task.started",
                Some(TaskSpanAttributes::new(&self.name, &task.id).to_event_data()),
            );
        }

        let outcome = task
            .wrap
            .run(WrapFrame::new(ctx, flow_options))
            .and_then(|mut frame| {
                let event = frame.direction.take().ok_or_else(|| WiringError::NoDirection {
                    task: task.id.clone(),
                })?;
                Ok((event, frame))
            });

        match outcome {
            Ok((event, frame)) => {
                if let Some(sink) = sink {
                    let attributes = TaskSpanAttributes::new(&self.name, &task.id)
                        .with_end(event.to_string(), event.role().as_str())
                        .with_duration_ms(timer.elapsed_ms());
                    sink.emit("circuit.task.completed", Some(attributes.to_event_data()));
                }
                Ok((event, frame))
            }
            Err(err) => {
                warn!(circuit = %self.name, task = %task.id, error = %err, "Task failed");
                if let Some(sink) = sink {
                    let attributes = TaskSpanAttributes::new(&self.name, &task.id)
                        .with_duration_ms(timer.elapsed_ms())
                        .with_error(err.to_string());
                    sink.emit("circuit.task.failed", Some(attributes.to_event_data()));
                }
                Err(err)
            }
        }
    }
}

impl Activity for Circuit {
    fn name(&self) -> &str {
        &self.name
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
        if let Some(event) = start_at {
            debug!(circuit = %self.name, direction = %event, "Ignoring start direction");
        }

        let sink = self.sink();
        let timer = SpanTimer::start();
        if let Some(sink) = &sink {
            sink.emit(
                "circuit.started",
                Some(json!({
                    "circuit": self.name,
                    "tasks": self.tasks.len(),
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            );
        }

        let mut index = 0;
        let mut invocations = 0;
        let mut ctx = ctx;
        let mut flow_options = flow_options;

        loop {
            if invocations >= self.config.max_task_invocations {
                return Err(NestflowError::StepLimitExceeded {
                    circuit: self.name.clone(),
                    limit: self.config.max_task_invocations,
                });
            }
            invocations += 1;

            let task = &self.tasks[index];
            let (event, frame) = self.run_task(task, ctx, flow_options, sink.as_deref())?;
            let role = &task.roles.role_for(&task.id, &event)?.role;

            match task.routes.get(role) {
                Some(Hop::Task(next)) => {
                    debug!(circuit = %self.name, from = %task.id, role = %role, to = %self.tasks[*next].id, "Routing");
                    index = *next;
                    ctx = frame.context;
                    flow_options = frame.flow_options;
                }
                Some(Hop::End(end)) => {
                    info!(
                        circuit = %self.name,
                        end_event = %end,
                        invocations,
                        "Circuit finished"
                    );
                    if let Some(sink) = &sink {
                        sink.emit(
                            "circuit.completed",
                            Some(json!({
                                "circuit": self.name,
                                "end_event": end.to_string(),
                                "role": end.role().as_str(),
                                "invocations": invocations,
                                "duration_ms": timer.elapsed_ms(),
                                "timestamp": chrono::Utc::now().to_rfc3339(),
                            })),
                        );
                    }
                    return Ok(Invocation::new(end.clone(), frame.context, frame.flow_options));
                }
                // Every role in the role map was resolved at build time.
                None => {
                    return Err(ConfigurationError::unroutable_role(&task.id, role.as_str()).into());
                }
            }
        }
    }

    fn is_nestable(&self) -> bool {
        true
    }

    fn lineage(&self) -> &[&'static str] {
        LINEAGE
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("name", &self.name)
            .field("tasks", &self.task_ids())
            .field("end_events", &self.end_events)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
