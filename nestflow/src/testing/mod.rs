//! Testing utilities for nested compositions.
//!
//! This module provides:
//! - Mock activities with fixed ends, recording and failing behavior
//! - Assertions for invocation results and contexts

mod assertions;
mod mocks;

pub use assertions::{
    assert_context_missing, assert_context_value, assert_ended_with, assert_ended_with_role,
};
pub use mocks::{FailingActivity, FixedEndActivity, RecordingActivity};
