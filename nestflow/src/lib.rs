//! # Nestflow
//!
//! Nested activity composition for circuit-based workflows.
//!
//! Nestflow lets one activity run inside another as a single task:
//!
//! - **Activities**: units of control flow finishing in named end events
//! - **Nesting**: adapt plain operands, map contexts in and out, expose the
//!   inner end events as roles the outer circuit routes on
//! - **Task wraps**: per-task pipelines the composer splices mappers into
//! - **Circuits**: role-routed task sequences that nest like any activity
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestflow::prelude::*;
//!
//! let validate = CircuitBuilder::new("validate")
//!     .step_fn("check", |ctx, _| Ok(ctx.contains_key("title")))?
//!     .build()?;
//!
//! let create = CircuitBuilder::new("create")
//!     .nested(
//!         Nested::new(Operand::activity(validate))
//!             .input(|ctx, _| ctx.wrap())
//!             .build()?,
//!     )?
//!     .build()?;
//!
//! let result = create.call(Context::from_pairs([("title", json!("Hello"))]))?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod activity;
pub mod circuit;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod nested;
pub mod observability;
pub mod testing;
pub mod wiring;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::activity::{
        Activity, Direction, EndKind, Invocation, NonActivity, Operand, Role, Step, TerminalEvent,
    };
    pub use crate::circuit::{Circuit, CircuitBuilder, Target};
    pub use crate::config::{CircuitConfig, CompositionConfig, LoggingConfig, NestflowConfig};
    pub use crate::context::{Context, FlowOptions, TaskConfig};
    pub use crate::errors::{
        ConfigurationError, DetectionError, ErrorInfo, MergeConflictError, NestflowError,
        TaskError, WiringError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::nested::{
        Composition, CopyMutableToOriginal, MergeStrategy, MergeStrategyKind, NestableCheck,
        Nested,
    };
    pub use crate::observability::init_logging;
    pub use crate::wiring::{Anchor, TaskWrap, WiringInstruction};
}
