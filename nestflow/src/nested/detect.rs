//! Deciding whether an operand can be nested as it is.

use crate::activity::Operand;
use crate::errors::DetectionError;
use tracing::debug;

/// Base every circuit declares in its lineage.
pub const OPERATION_BASE: &str = "operation";

/// Predicate deciding whether an operand is natively nestable.
///
/// Closures `Fn(&Operand) -> Result<bool, DetectionError>` implement it.
pub trait NestableCheck: Send + Sync {
    /// Returns true if the operand can be nested without the adapter.
    fn check(&self, operand: &Operand) -> Result<bool, DetectionError>;
}

impl<F> NestableCheck for F
where
    F: Fn(&Operand) -> Result<bool, DetectionError> + Send + Sync,
{
    fn check(&self, operand: &Operand) -> Result<bool, DetectionError> {
        self(operand)
    }
}

/// The bases an activity may declare to count as nestable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityRegistry {
    bases: Vec<String>,
}

impl CompatibilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self { bases: Vec::new() }
    }

    /// Creates a registry from base names.
    pub fn from_bases(bases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            bases: bases.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a base.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    /// Returns the registered bases.
    #[must_use]
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// Compares a lineage against the registered bases.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::Incomparable` when the lineage is empty.
    pub fn compare(&self, operand: &str, lineage: &[&str]) -> Result<bool, DetectionError> {
        if lineage.is_empty() {
            return Err(DetectionError::incomparable(operand));
        }
        Ok(lineage
            .iter()
            .any(|base| self.bases.iter().any(|known| known.as_str() == *base)))
    }
}

impl Default for CompatibilityRegistry {
    fn default() -> Self {
        Self::from_bases([OPERATION_BASE])
    }
}

/// Nestable if marked so, or if its lineage matches a registered base.
#[derive(Debug, Clone, Default)]
pub struct DefaultNestableCheck {
    registry: CompatibilityRegistry,
}

impl DefaultNestableCheck {
    /// Creates a check backed by the given registry.
    #[must_use]
    pub fn new(registry: CompatibilityRegistry) -> Self {
        Self { registry }
    }
}

impl NestableCheck for DefaultNestableCheck {
    fn check(&self, operand: &Operand) -> Result<bool, DetectionError> {
        match operand {
            Operand::Activity(activity) => {
                if activity.is_nestable() {
                    return Ok(true);
                }
                self.registry.compare(activity.name(), activity.lineage())
            }
            Operand::Dynamic { .. } => Ok(false),
        }
    }
}

/// Runs a check, reading `Incomparable` as "not nestable".
///
/// # Errors
///
/// Any other detection error propagates unchanged.
pub fn is_nestable(check: &dyn NestableCheck, operand: &Operand) -> Result<bool, DetectionError> {
    match check.check(operand) {
        Err(DetectionError::Incomparable { operand }) => {
            debug!(operand = %operand, "Operand is not comparable, treating as not nestable");
            Ok(false)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::context::{Context, FlowOptions};
    use crate::testing::FixedEndActivity;
    use std::sync::Arc;

    #[test]
    fn test_marker_is_nestable() {
        let operand = Operand::activity(FixedEndActivity::success("inner").nestable());
        assert!(is_nestable(&DefaultNestableCheck::default(), &operand).unwrap());
    }

    #[test]
    fn test_lineage_is_nestable() {
        let operand = Operand::activity(FixedEndActivity::success("inner").with_lineage(OPERATION_BASE));
        assert!(is_nestable(&DefaultNestableCheck::default(), &operand).unwrap());

        let other = Operand::activity(FixedEndActivity::success("inner").with_lineage("service"));
        assert!(!is_nestable(&DefaultNestableCheck::default(), &other).unwrap());
    }

    #[test]
    fn test_registry_extension() {
        let check = DefaultNestableCheck::new(CompatibilityRegistry::empty().with_base("service"));
        let operand = Operand::activity(FixedEndActivity::success("inner").with_lineage("service"));
        assert!(is_nestable(&check, &operand).unwrap());
    }

    #[test]
    fn test_incomparable_is_not_nestable() {
        let operand = Operand::activity(FixedEndActivity::success("plain"));

        let raw = DefaultNestableCheck::default().check(&operand);
        assert!(matches!(raw, Err(DetectionError::Incomparable { .. })));
        assert!(!is_nestable(&DefaultNestableCheck::default(), &operand).unwrap());
    }

    #[test]
    fn test_dynamic_is_not_nestable() {
        let operand = Operand::dynamic("dyn", |_: &Context, _: &FlowOptions| {
            let activity: Arc<dyn Activity> = Arc::new(FixedEndActivity::success("x"));
            Ok(activity)
        });
        assert!(!is_nestable(&DefaultNestableCheck::default(), &operand).unwrap());
    }

    #[test]
    fn test_unrelated_failure_propagates() {
        let check = |operand: &Operand| -> Result<bool, DetectionError> {
            Err(DetectionError::failed(operand.name(), "registry offline"))
        };
        let operand = Operand::activity(FixedEndActivity::success("inner"));

        let err = is_nestable(&check, &operand).unwrap_err();
        assert!(matches!(err, DetectionError::Failed { .. }));
    }
}
