//! Activities: units of control flow with named end events.
//!
//! An [`Activity`] exposes a fixed, ordered set of [`TerminalEvent`]s and an
//! `invoke` operation that finishes in one of them. Activities that implement
//! the trait natively can be nested as they are; anything else goes through
//! the [`NonActivity`] adapter.

mod adapter;
mod step;
mod terminal;

pub use adapter::{NonActivity, Operand, Resolve};
pub use step::Step;
pub use terminal::{EndKind, Role, TerminalEvent};

use crate::context::{Context, FlowOptions};
use crate::errors::NestflowError;
use std::fmt::Debug;

/// Where an invocation starts. `None` means the activity's default start.
pub type Direction = Option<TerminalEvent>;

/// The outcome of invoking an activity.
#[derive(Debug)]
pub struct Invocation {
    /// The end event the activity finished in.
    pub event: TerminalEvent,
    /// The resulting context.
    pub context: Context,
    /// The resulting flow options.
    pub flow_options: FlowOptions,
}

impl Invocation {
    /// Creates a new invocation result.
    #[must_use]
    pub fn new(event: TerminalEvent, context: Context, flow_options: FlowOptions) -> Self {
        Self {
            event,
            context,
            flow_options,
        }
    }
}

/// Trait for activities.
pub trait Activity: Send + Sync + Debug {
    /// Returns the name of the activity.
    fn name(&self) -> &str;

    /// Returns the end events, fixed at construction.
    fn end_events(&self) -> &[TerminalEvent];

    /// Invokes the activity.
    ///
    /// Errors raised by user code are propagated, never recovered.
    fn invoke(
        &self,
        start_at: Direction,
        ctx: Context,
        flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError>;

    /// Marks the activity as natively nestable.
    fn is_nestable(&self) -> bool {
        false
    }

    /// Names of the bases this activity is compatible with.
    fn lineage(&self) -> &[&'static str] {
        &[]
    }
}
