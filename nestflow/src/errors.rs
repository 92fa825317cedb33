//! Error types for the nestflow composition engine.
//!
//! Build-time problems surface as [`ConfigurationError`]s carrying an
//! [`ErrorInfo`] diagnostic. Errors raised by user tasks travel through the
//! engine untouched as [`TaskError`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for nestflow operations.
#[derive(Debug, Error)]
pub enum NestflowError {
    /// A composition or circuit was misconfigured.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Capability detection failed.
    #[error("{0}")]
    Detection(#[from] DetectionError),

    /// A task wrap could not be wired or run.
    #[error("{0}")]
    Wiring(#[from] WiringError),

    /// A merge strategy refused to reconcile two contexts.
    #[error("{0}")]
    MergeConflict(#[from] MergeConflictError),

    /// A user task failed.
    #[error("{0}")]
    Task(#[from] TaskError),

    /// A circuit routed more tasks than it is allowed to.
    #[error("Circuit '{circuit}' exceeded {limit} task invocations")]
    StepLimitExceeded {
        /// The circuit name.
        circuit: String,
        /// The configured limit.
        limit: usize,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for NestflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Diagnostic metadata attached to configuration errors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    /// Error code (e.g., "NESTED-001-NO_END_EVENTS").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("summary".to_string(), serde_json::json!(self.summary));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        if !self.context.is_empty() {
            map.insert("context".to_string(), serde_json::json!(self.context));
        }

        map
    }
}

/// Error raised when a composition or circuit cannot be built.
///
/// These are always fatal at build time: a misconfigured composition must
/// never turn into silently wrong routing at run time.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The task involved, if any.
    pub task: Option<String>,
    /// Diagnostic info.
    pub error_info: Option<ErrorInfo>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            task: None,
            error_info: None,
        }
    }

    /// Sets the task involved.
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Sets the diagnostic info.
    #[must_use]
    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the diagnostic code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// The activity declares no end events, so nothing could ever be routed.
    #[must_use]
    pub fn no_end_events(task: impl Into<String>) -> Self {
        let task = task.into();
        Self::new(format!("Activity '{task}' declares no end events"))
            .with_error_info(
                ErrorInfo::new("NESTED-001-NO_END_EVENTS", "Nested activity has an empty end event set")
                    .with_fix_hint("Declare at least one end event on the nested activity.")
                    .with_context_entry("task", &task),
            )
            .with_task(task)
    }

    /// The activity emitted an end event that has no role mapping.
    #[must_use]
    pub fn unmapped_end_event(task: impl Into<String>, event: &str) -> Self {
        let task = task.into();
        Self::new(format!("End event '{event}' of task '{task}' has no role mapping"))
            .with_error_info(
                ErrorInfo::new("NESTED-002-UNMAPPED_END", format!("End event '{event}' is not mapped"))
                    .with_fix_hint("Only emit end events the activity declares in end_events().")
                    .with_context_entry("event", event),
            )
            .with_task(task)
    }

    /// The activity lists the same end event twice.
    #[must_use]
    pub fn duplicate_end_event(task: impl Into<String>, event: &str) -> Self {
        let task = task.into();
        Self::new(format!("Activity '{task}' declares end event '{event}' more than once"))
            .with_error_info(ErrorInfo::new(
                "NESTED-003-DUPLICATE_END",
                format!("End event '{event}' is declared twice"),
            ))
            .with_task(task)
    }

    /// A dynamic operand was reported nestable but exposes no activity.
    #[must_use]
    pub fn not_an_activity(operand: impl Into<String>) -> Self {
        let operand = operand.into();
        Self::new(format!(
            "Operand '{operand}' was reported nestable but does not expose an activity"
        ))
        .with_error_info(
            ErrorInfo::new("NESTED-004-NOT_ACTIVITY", "Nestable check accepted a dynamic operand")
                .with_fix_hint("Return false from the nestable check for dynamic operands so they get adapted."),
        )
        .with_task(operand)
    }

    /// A role emitted by a task has nowhere to go.
    #[must_use]
    pub fn unroutable_role(task: impl Into<String>, role: &str) -> Self {
        let task = task.into();
        Self::new(format!("Role '{role}' of task '{task}' cannot be routed"))
            .with_error_info(
                ErrorInfo::new("CIRCUIT-001-UNROUTABLE", format!("No route for role '{role}'"))
                    .with_fix_hint("Declare an end with this role or add an explicit route.")
                    .with_context_entry("role", role),
            )
            .with_task(task)
    }

    /// A route points at a task or end that does not exist.
    #[must_use]
    pub fn unknown_target(task: impl Into<String>, target: &str) -> Self {
        let task = task.into();
        Self::new(format!("Task '{task}' routes to unknown target '{target}'"))
            .with_error_info(ErrorInfo::new(
                "CIRCUIT-002-UNKNOWN_TARGET",
                format!("Target '{target}' does not exist"),
            ))
            .with_task(task)
    }

    /// A route was declared for a task the circuit does not have.
    #[must_use]
    pub fn unknown_task(task: impl Into<String>) -> Self {
        let task = task.into();
        Self::new(format!("Route declared for unknown task '{task}'"))
            .with_error_info(
                ErrorInfo::new("CIRCUIT-005-UNKNOWN_TASK", format!("Task '{task}' does not exist"))
                    .with_fix_hint("Add the task with step() or nested() before building."),
            )
            .with_task(task)
    }

    /// A route was declared for a role the task never ends in.
    #[must_use]
    pub fn unknown_role(task: impl Into<String>, role: &str) -> Self {
        let task = task.into();
        Self::new(format!("Task '{task}' never ends in role '{role}'"))
            .with_error_info(
                ErrorInfo::new("CIRCUIT-006-UNKNOWN_ROLE", format!("Role '{role}' is not produced by the task"))
                    .with_fix_hint("Route only roles of the task's end events. Adapted operands end in success or failure.")
                    .with_context_entry("role", role),
            )
            .with_task(task)
    }

    /// The circuit may not invoke any task.
    #[must_use]
    pub fn zero_invocation_limit(name: impl Into<String>) -> Self {
        Self::new(format!(
            "Circuit '{}' has max_task_invocations set to 0",
            name.into()
        ))
        .with_error_info(
            ErrorInfo::new("CIRCUIT-007-NO_INVOCATIONS", "Invocation limit must be at least 1")
                .with_fix_hint("Raise circuit.max_task_invocations or keep the default of 1000."),
        )
    }

    /// Two tasks share an id.
    #[must_use]
    pub fn duplicate_task(task: impl Into<String>) -> Self {
        let task = task.into();
        Self::new(format!("Task '{task}' is already part of the circuit"))
            .with_error_info(
                ErrorInfo::new("CIRCUIT-003-DUPLICATE_TASK", "Task ids must be unique")
                    .with_fix_hint("Give the nested composition an explicit name."),
            )
            .with_task(task)
    }

    /// The circuit has no tasks.
    #[must_use]
    pub fn empty_circuit(name: impl Into<String>) -> Self {
        Self::new(format!("Circuit '{}' has no tasks", name.into())).with_error_info(
            ErrorInfo::new("CIRCUIT-004-EMPTY", "Cannot build an empty circuit")
                .with_fix_hint("Add at least one task to the circuit before building."),
        )
    }

}

/// Errors raised while deciding whether an operand is nestable.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    /// The operand cannot be compared against the compatible bases.
    ///
    /// This is the one detection failure that means "not nestable".
    #[error("Operand '{operand}' cannot be compared against compatible bases")]
    Incomparable {
        /// The operand name.
        operand: String,
    },

    /// The check itself failed.
    #[error("Nestable check failed for '{operand}': {reason}")]
    Failed {
        /// The operand name.
        operand: String,
        /// The reason for failure.
        reason: String,
    },
}

impl DetectionError {
    /// Creates an incomparable error.
    #[must_use]
    pub fn incomparable(operand: impl Into<String>) -> Self {
        Self::Incomparable {
            operand: operand.into(),
        }
    }

    /// Creates a failed check error.
    #[must_use]
    pub fn failed(operand: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            operand: operand.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to task wrap wiring.
#[derive(Debug, Clone, Error)]
pub enum WiringError {
    /// An instruction referenced an anchor the task wrap does not have.
    #[error("Unknown anchor '{anchor}' in task wrap of '{task}'")]
    UnknownAnchor {
        /// The task whose wrap was altered.
        task: String,
        /// The anchor.
        anchor: String,
    },

    /// An instruction inserted a node id that is already present.
    #[error("Node '{node}' already exists in task wrap of '{task}'")]
    DuplicateNode {
        /// The task whose wrap was altered.
        task: String,
        /// The node id.
        node: String,
    },

    /// The output mapper ran without an original context to merge into.
    #[error("Node '{node}' found no original context in the task config")]
    MissingOriginalContext {
        /// The node id.
        node: String,
    },

    /// The task wrap finished without the task reporting an end event.
    #[error("Task wrap of '{task}' finished without a direction")]
    NoDirection {
        /// The task name.
        task: String,
    },
}

/// Error raised when a merge strategy refuses to overwrite a value.
#[derive(Debug, Clone, Error)]
#[error("Merge conflict: key '{key}' already holds a different value")]
pub struct MergeConflictError {
    /// The conflicting key.
    pub key: String,
}

impl MergeConflictError {
    /// Creates a new merge conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Error raised by a user task.
#[derive(Debug, Clone, Error)]
#[error("Task {task} failed: {message}")]
pub struct TaskError {
    /// Task that failed.
    pub task: String,
    /// Original error message.
    pub message: String,
}

impl TaskError {
    /// Creates a new task error.
    #[must_use]
    pub fn new(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_info_creation() {
        let info = ErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("task", "my_task");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
        assert_eq!(info.context.get("task"), Some(&"my_task".to_string()));
    }

    #[test]
    fn test_error_info_to_dict() {
        let dict = ErrorInfo::new("TEST-001", "Test error").to_dict();
        assert_eq!(dict.get("code").unwrap(), "TEST-001");
        assert!(!dict.contains_key("fix_hint"));
    }

    #[test]
    fn test_no_end_events_error() {
        let err = ConfigurationError::no_end_events("Nested(inner)");

        assert_eq!(err.code(), Some("NESTED-001-NO_END_EVENTS"));
        assert_eq!(err.task.as_deref(), Some("Nested(inner)"));
        assert!(err.to_string().contains("declares no end events"));
    }

    #[test]
    fn test_unroutable_role_error() {
        let err = ConfigurationError::unroutable_role("validate", "pass_fast");
        assert_eq!(err.code(), Some("CIRCUIT-001-UNROUTABLE"));
        assert!(err.to_string().contains("pass_fast"));
    }

    #[test]
    fn test_task_error_converts() {
        let err: NestflowError = TaskError::new("process", "boom").into();
        assert!(matches!(err, NestflowError::Task(_)));
        assert_eq!(err.to_string(), "Task process failed: boom");
    }

    #[test]
    fn test_serde_error_converts() {
        let err: NestflowError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, NestflowError::Serialization(_)));
    }
}
