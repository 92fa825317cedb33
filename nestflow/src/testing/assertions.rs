//! Test assertions for invocations and contexts.

use crate::activity::{Invocation, TerminalEvent};
use crate::context::Context;

/// Asserts that the invocation finished in the given end event (by identity).
pub fn assert_ended_with(invocation: &Invocation, expected: &TerminalEvent) {
    assert!(
        invocation.event == *expected,
        "Expected end {:?}, got {:?}",
        expected,
        invocation.event
    );
}

/// Asserts that the invocation finished in an end with the given role.
pub fn assert_ended_with_role(invocation: &Invocation, role: &str) {
    assert_eq!(
        invocation.event.role().as_str(),
        role,
        "Expected role '{}', got end {:?}",
        role,
        invocation.event
    );
}

/// Asserts that a context holds the expected value.
pub fn assert_context_value(ctx: &Context, key: &str, expected: &serde_json::Value) {
    let actual = ctx.get(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {:?} for key '{}', got {:?}",
        expected,
        key,
        actual
    );
}

/// Asserts that a context does not hold a key.
pub fn assert_context_missing(ctx: &Context, key: &str) {
    assert!(
        ctx.get(key).is_none(),
        "Expected key '{}' to be absent, got {:?}",
        key,
        ctx.get(key)
    );
}
