//! Outer circuits: sequences of tasks routed by end event role.
//!
//! A [`Circuit`] runs each task inside its [`TaskWrap`](crate::wiring::TaskWrap),
//! reads the role of the end event the task finished in, and follows the
//! route for that role to the next task or to one of its own end events.
//! Circuits are activities themselves, so they nest.

mod builder;
mod runner;


pub use builder::CircuitBuilder;
pub use runner::Circuit;

use crate::activity::Role;

/// Where a role of a task leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The following task, or the `success` end after the last task.
    Next,
    /// The task with this id.
    Task(String),
    /// The circuit end declaring this role.
    End(Role),
}

impl Target {
    /// Targets the task with the given id.
    #[must_use]
    pub fn task(id: impl Into<String>) -> Self {
        Self::Task(id.into())
    }

    /// Targets the end with the given role.
    #[must_use]
    pub fn end(role: impl Into<Role>) -> Self {
        Self::End(role.into())
    }
}
