//! Wiring instructions and task wraps.
//!
//! A [`WiringInstruction`] is a declarative edit applied to a [`TaskWrap`]
//! when the outer circuit is assembled. Instructions are positional: several
//! instructions targeting the same anchor apply in declaration order.

mod task_wrap;

pub use task_wrap::{CallTask, TaskWrap, WrapFrame, WrapStep, CALL_TASK};

use crate::activity::Direction;
use std::fmt;
use std::sync::Arc;

/// The kind of edit an instruction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alteration {
    /// Insert the node immediately before the anchor.
    InsertBefore,
}

/// Selects one of a task wrap's end nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndSelector {
    /// The wrap's default end.
    Default,
}

/// A position in a task wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// A node, by id.
    Node(String),
    /// An end node.
    End(EndSelector),
}

impl Anchor {
    /// Anchors on a node id.
    #[must_use]
    pub fn node(id: impl Into<String>) -> Self {
        Self::Node(id.into())
    }

    /// Anchors on the default end.
    #[must_use]
    pub fn default_end() -> Self {
        Self::End(EndSelector::Default)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => f.write_str(id),
            Self::End(EndSelector::Default) => f.write_str("End.default"),
        }
    }
}

/// Decides whether a node runs for the current direction.
#[derive(Clone, Default)]
pub enum Incoming {
    /// Always run.
    #[default]
    Always,
    /// Run when the predicate holds.
    When(Arc<dyn Fn(&Direction) -> bool + Send + Sync>),
}

impl Incoming {
    /// Creates a predicate-based incoming edge.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Direction) -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(predicate))
    }

    /// Returns true if the node should run.
    #[must_use]
    pub fn accepts(&self, direction: &Direction) -> bool {
        match self {
            Self::Always => true,
            Self::When(predicate) => predicate(direction),
        }
    }
}

impl fmt::Debug for Incoming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Where control goes after a node ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outgoing {
    /// Continue with the next node.
    #[default]
    Right,
}

/// A declarative edit to a task wrap.
#[derive(Clone)]
pub struct WiringInstruction {
    /// The edit to perform.
    pub alteration: Alteration,
    /// Where to perform it.
    pub anchor: Anchor,
    /// Id of the new node.
    pub id: String,
    /// The new node's step.
    pub step: Arc<dyn WrapStep>,
    /// Incoming predicate of the new node.
    pub incoming: Incoming,
    /// Outgoing edge of the new node.
    pub outgoing: Outgoing,
}

impl WiringInstruction {
    /// Inserts a node before the anchor, always entered, single right edge.
    pub fn insert_before(anchor: Anchor, id: impl Into<String>, step: Arc<dyn WrapStep>) -> Self {
        Self {
            alteration: Alteration::InsertBefore,
            anchor,
            id: id.into(),
            step,
            incoming: Incoming::Always,
            outgoing: Outgoing::Right,
        }
    }
}

impl fmt::Debug for WiringInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringInstruction")
            .field("alteration", &self.alteration)
            .field("anchor", &self.anchor)
            .field("id", &self.id)
            .field("incoming", &self.incoming)
            .field("outgoing", &self.outgoing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::TerminalEvent;

    #[test]
    fn test_anchor_display() {
        assert_eq!(Anchor::node(CALL_TASK).to_string(), "task_wrap.call_task");
        assert_eq!(Anchor::default_end().to_string(), "End.default");
    }

    #[test]
    fn test_incoming_predicates() {
        assert!(Incoming::Always.accepts(&None));

        let only_started = Incoming::when(Option::is_some);
        assert!(!only_started.accepts(&None));
        assert!(only_started.accepts(&Some(TerminalEvent::success())));
    }
}
