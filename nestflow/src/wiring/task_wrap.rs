//! The per-task pipeline that wiring instructions alter.

use super::{Alteration, Anchor, Incoming, Outgoing, WiringInstruction};
use crate::activity::{Activity, Direction};
use crate::context::{Context, FlowOptions, TaskConfig};
use crate::errors::{NestflowError, WiringError};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Node id of the step that invokes the wrapped task.
pub const CALL_TASK: &str = "task_wrap.call_task";

/// Everything a task wrap step receives and hands on.
#[derive(Debug)]
pub struct WrapFrame {
    /// The current direction; set by the task once it has run.
    pub direction: Direction,
    /// The context for the next step.
    pub context: Context,
    /// Flow options for the next step.
    pub flow_options: FlowOptions,
    /// Task-local configuration.
    pub task_config: TaskConfig,
    /// Flow options as they were when the task wrap started.
    pub original_flow_options: FlowOptions,
}

impl WrapFrame {
    /// Creates a frame for one run of a task wrap.
    #[must_use]
    pub fn new(context: Context, flow_options: FlowOptions) -> Self {
        Self {
            direction: None,
            context,
            original_flow_options: flow_options.clone(),
            flow_options,
            task_config: TaskConfig::new(),
        }
    }

    /// Sets the starting direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// A step inside a task wrap.
pub trait WrapStep: Send + Sync {
    /// Runs the step.
    fn call(&self, frame: WrapFrame) -> Result<WrapFrame, NestflowError>;
}

/// Invokes the wrapped task and records its end event as the direction.
#[derive(Debug)]
pub struct CallTask {
    task: Arc<dyn Activity>,
}

impl CallTask {
    /// Creates a call step for a task.
    #[must_use]
    pub fn new(task: Arc<dyn Activity>) -> Self {
        Self { task }
    }
}

impl WrapStep for CallTask {
    fn call(&self, mut frame: WrapFrame) -> Result<WrapFrame, NestflowError> {
        let invocation = self
            .task
            .invoke(frame.direction.take(), frame.context, frame.flow_options)?;

        frame.direction = Some(invocation.event);
        frame.context = invocation.context;
        frame.flow_options = invocation.flow_options;
        Ok(frame)
    }
}

struct WrapNode {
    id: String,
    step: Arc<dyn WrapStep>,
    incoming: Incoming,
    outgoing: Outgoing,
}

/// A task wrapped in its own tiny pipeline.
///
/// A fresh wrap is `[task_wrap.call_task] -> End.default`. Wiring
/// instructions insert nodes before an existing node or before the end.
pub struct TaskWrap {
    task: Arc<dyn Activity>,
    nodes: Vec<WrapNode>,
}

impl TaskWrap {
    /// Creates the default wrap around a task.
    #[must_use]
    pub fn new(task: Arc<dyn Activity>) -> Self {
        let call = WrapNode {
            id: CALL_TASK.to_string(),
            step: Arc::new(CallTask::new(Arc::clone(&task))),
            incoming: Incoming::Always,
            outgoing: Outgoing::Right,
        };
        Self {
            task,
            nodes: vec![call],
        }
    }

    /// Returns the wrapped task.
    #[must_use]
    pub fn task(&self) -> &Arc<dyn Activity> {
        &self.task
    }

    /// Returns the node ids in execution order, ending with `End.default`.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node.id.clone())
            .chain(std::iter::once(Anchor::default_end().to_string()))
            .collect()
    }

    /// Applies one wiring instruction.
    ///
    /// # Errors
    ///
    /// Returns a `WiringError` for unknown anchors or duplicate node ids.
    pub fn apply(&mut self, instruction: WiringInstruction) -> Result<(), WiringError> {
        let WiringInstruction {
            alteration,
            anchor,
            id,
            step,
            incoming,
            outgoing,
        } = instruction;

        if self.nodes.iter().any(|node| node.id == id) {
            return Err(WiringError::DuplicateNode {
                task: self.task.name().to_string(),
                node: id,
            });
        }

        let position = match &anchor {
            Anchor::Node(target) => self
                .nodes
                .iter()
                .position(|node| &node.id == target)
                .ok_or_else(|| WiringError::UnknownAnchor {
                    task: self.task.name().to_string(),
                    anchor: anchor.to_string(),
                })?,
            Anchor::End(_) => self.nodes.len(),
        };

        match alteration {
            Alteration::InsertBefore => {
                trace!(task = %self.task.name(), node = %id, anchor = %anchor, "Inserting task wrap node");
                self.nodes.insert(
                    position,
                    WrapNode {
                        id,
                        step,
                        incoming,
                        outgoing,
                    },
                );
            }
        }

        Ok(())
    }

    /// Applies instructions in list order.
    ///
    /// # Errors
    ///
    /// Stops at the first instruction that fails.
    pub fn apply_all(
        &mut self,
        instructions: impl IntoIterator<Item = WiringInstruction>,
    ) -> Result<(), WiringError> {
        for instruction in instructions {
            self.apply(instruction)?;
        }
        Ok(())
    }

    /// Runs every node whose incoming predicate accepts the current direction.
    ///
    /// # Errors
    ///
    /// Propagates the first step error.
    pub fn run(&self, mut frame: WrapFrame) -> Result<WrapFrame, NestflowError> {
        for node in &self.nodes {
            if !node.incoming.accepts(&frame.direction) {
                continue;
            }
            frame = node.step.call(frame)?;
            match node.outgoing {
                Outgoing::Right => {}
            }
        }
        Ok(frame)
    }
}

impl fmt::Debug for TaskWrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWrap")
            .field("task", &self.task.name())
            .field("nodes", &self.ids())
            .finish()
    }
}
