//! Terminal events and their roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Structural classification of an end event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    /// A successful end.
    Success,
    /// A failed end.
    Failure,
    /// Any other end (e.g. pass fast, fail fast).
    Custom,
}

impl fmt::Display for EndKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// The outer-facing role an end event plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Creates a role.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// The success role.
    #[must_use]
    pub fn success() -> Self {
        Self::new("success")
    }

    /// The failure role.
    #[must_use]
    pub fn failure() -> Self {
        Self::new("failure")
    }

    /// The pass-fast role.
    #[must_use]
    pub fn pass_fast() -> Self {
        Self::new("pass_fast")
    }

    /// The fail-fast role.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self::new("fail_fast")
    }

    /// Returns the role as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

#[derive(Debug)]
struct EventInner {
    name: String,
    role: Role,
    kind: EndKind,
}

/// A named end state an activity can finish in.
///
/// Equality is identity based: two events built separately are different
/// even if their names match. Cloning shares the identity.
#[derive(Clone)]
pub struct TerminalEvent {
    inner: Arc<EventInner>,
}

impl TerminalEvent {
    /// Creates a new end event with a declared role.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, kind: EndKind) -> Self {
        Self {
            inner: Arc::new(EventInner {
                name: name.into(),
                role,
                kind,
            }),
        }
    }

    /// Creates a new success end.
    #[must_use]
    pub fn success() -> Self {
        Self::new("success", Role::success(), EndKind::Success)
    }

    /// Creates a new failure end.
    #[must_use]
    pub fn failure() -> Self {
        Self::new("failure", Role::failure(), EndKind::Failure)
    }

    /// Creates a new pass-fast end.
    #[must_use]
    pub fn pass_fast() -> Self {
        Self::new("pass_fast", Role::pass_fast(), EndKind::Custom)
    }

    /// Creates a new fail-fast end.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self::new("fail_fast", Role::fail_fast(), EndKind::Custom)
    }

    /// Creates a custom end whose role equals its name.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        let role = Role::new(name.clone());
        Self::new(name, role, EndKind::Custom)
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the declared role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.inner.role
    }

    /// Returns the structural kind.
    #[must_use]
    pub fn kind(&self) -> EndKind {
        self.inner.kind
    }

    /// Returns true for ends of the `Success` kind.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.inner.kind == EndKind::Success
    }
}

impl PartialEq for TerminalEvent {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TerminalEvent {}

impl Hash for TerminalEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl fmt::Debug for TerminalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalEvent")
            .field("name", &self.inner.name)
            .field("role", &self.inner.role)
            .field("kind", &self.inner.kind)
            .finish()
    }
}

impl fmt::Display for TerminalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "End.{}", self.inner.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        let a = TerminalEvent::success();
        let b = TerminalEvent::success();

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_hash_by_identity() {
        let a = TerminalEvent::custom("done");
        let b = TerminalEvent::custom("done");

        let set: HashSet<TerminalEvent> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_declared_roles() {
        assert_eq!(TerminalEvent::success().role(), &Role::success());
        assert_eq!(TerminalEvent::pass_fast().role().as_str(), "pass_fast");
        assert_eq!(TerminalEvent::custom("halted").role().as_str(), "halted");

        let event = TerminalEvent::new("Ok", Role::success(), EndKind::Success);
        assert_eq!(event.name(), "Ok");
        assert!(event.is_success());
    }

    #[test]
    fn test_kind_classification() {
        assert!(TerminalEvent::success().is_success());
        assert!(!TerminalEvent::failure().is_success());
        assert_eq!(TerminalEvent::fail_fast().kind(), EndKind::Custom);
    }

    #[test]
    fn test_display() {
        assert_eq!(TerminalEvent::pass_fast().to_string(), "End.pass_fast");
        assert_eq!(EndKind::Failure.to_string(), "failure");
        assert_eq!(Role::failure().to_string(), "failure");
    }

    #[test]
    fn test_role_serialize() {
        let json = serde_json::to_string(&Role::pass_fast()).unwrap();
        assert_eq!(json, r#""pass_fast""#);
    }
}
