//! Nesting one activity inside another.
//!
//! [`Nested`] turns an operand into a [`Composition`]: a circuit-level task,
//! its metadata, the wiring instructions splicing the input and output
//! mappers around the task call, and the role of each inner end event.
//! The composer never touches the outer circuit itself.

mod composer;
mod detect;
mod input;
mod output;

pub use composer::{
    resolve_activity, Composition, Nested, NestedTask, RoleRecord, TaskMetadata, TerminalRoleMap,
};
pub use detect::{
    is_nestable, CompatibilityRegistry, DefaultNestableCheck, NestableCheck, OPERATION_BASE,
};
pub use input::{Derivation, InputMapper};
pub use output::{
    ConflictDetectingMerge, CopyMutableToOriginal, MergeStrategy, MergeStrategyKind, OutputMapper,
};

/// Default node id of the input mapper.
pub const INPUT_NODE_ID: &str = ".input";

/// Default node id of the output mapper.
pub const OUTPUT_NODE_ID: &str = ".output";
