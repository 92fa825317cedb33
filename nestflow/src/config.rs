//! Configuration types for composition, circuits and logging.

use crate::errors::{ConfigurationError, NestflowError};
use crate::nested::{MergeStrategyKind, INPUT_NODE_ID, OPERATION_BASE, OUTPUT_NODE_ID};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for composing nested tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Add the output mapper only when an input derivation is given.
    #[serde(default)]
    pub couple_output_to_input: bool,
    /// Strategy used when output mapping is implied.
    #[serde(default)]
    pub merge_strategy: MergeStrategyKind,
    /// Node id of the input mapper.
    #[serde(default = "default_input_node_id")]
    pub input_node_id: String,
    /// Node id of the output mapper.
    #[serde(default = "default_output_node_id")]
    pub output_node_id: String,
    /// Lineage bases treated as natively nestable.
    #[serde(default = "default_compatible_bases")]
    pub compatible_bases: Vec<String>,
}

fn default_input_node_id() -> String {
    INPUT_NODE_ID.to_string()
}

fn default_output_node_id() -> String {
    OUTPUT_NODE_ID.to_string()
}

fn default_compatible_bases() -> Vec<String> {
    vec![OPERATION_BASE.to_string()]
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            couple_output_to_input: false,
            merge_strategy: MergeStrategyKind::default(),
            input_node_id: default_input_node_id(),
            output_node_id: default_output_node_id(),
            compatible_bases: default_compatible_bases(),
        }
    }
}

impl CompositionConfig {
    /// Creates a composition configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default merge strategy.
    #[must_use]
    pub fn with_merge_strategy(mut self, kind: MergeStrategyKind) -> Self {
        self.merge_strategy = kind;
        self
    }

    /// Couples output mapping to input mapping.
    #[must_use]
    pub fn with_coupled_output(mut self, coupled: bool) -> Self {
        self.couple_output_to_input = coupled;
        self
    }

    /// Adds a nestable lineage base.
    #[must_use]
    pub fn with_compatible_base(mut self, base: impl Into<String>) -> Self {
        self.compatible_bases.push(base.into());
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.input_node_id.is_empty() || self.output_node_id.is_empty() {
            return Err(ConfigurationError::new("Mapper node ids must not be empty"));
        }
        if self.input_node_id == self.output_node_id {
            return Err(ConfigurationError::new(format!(
                "Input and output mappers share the node id '{}'",
                self.input_node_id
            )));
        }
        Ok(())
    }
}

/// Configuration for running circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Maximum task invocations per circuit run.
    #[serde(default = "default_max_task_invocations")]
    pub max_task_invocations: usize,
    /// Emit circuit lifecycle events to the event sink.
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
}

fn default_max_task_invocations() -> usize {
    1000
}

fn default_emit_events() -> bool {
    true
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            max_task_invocations: default_max_task_invocations(),
            emit_events: default_emit_events(),
        }
    }
}

impl CircuitConfig {
    /// Sets the invocation limit.
    #[must_use]
    pub fn with_max_task_invocations(mut self, limit: usize) -> Self {
        self.max_task_invocations = limit;
        self
    }
}

/// Configuration for logging setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub default_level: String,
    /// Emit JSON lines instead of plain text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: default_level(),
            json: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestflowConfig {
    /// Composition settings.
    #[serde(default)]
    pub composition: CompositionConfig,
    /// Circuit settings.
    #[serde(default)]
    pub circuit: CircuitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NestflowConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are inconsistent.
    pub fn from_json_str(json: &str) -> Result<Self, NestflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NestflowError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks the values for consistency.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.composition.validate()?;
        if self.circuit.max_task_invocations == 0 {
            return Err(ConfigurationError::zero_invocation_limit("circuit"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NestflowConfig::default();
        assert!(!config.composition.couple_output_to_input);
        assert_eq!(config.composition.input_node_id, ".input");
        assert_eq!(config.composition.output_node_id, ".output");
        assert_eq!(config.composition.compatible_bases, vec!["operation".to_string()]);
        assert_eq!(config.circuit.max_task_invocations, 1000);
        assert_eq!(config.logging.default_level, "info");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = NestflowConfig::from_json_str(
            r#"{"composition": {"merge_strategy": "conflict_detecting"}, "circuit": {"max_task_invocations": 5}}"#,
        )
        .unwrap();

        assert_eq!(config.composition.merge_strategy, MergeStrategyKind::ConflictDetecting);
        assert_eq!(config.composition.input_node_id, ".input");
        assert_eq!(config.circuit.max_task_invocations, 5);
        assert!(config.circuit.emit_events);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(NestflowConfig::from_json_str(r#"{"circuit": {"max_task_invocations": 0}}"#).is_err());
        assert!(NestflowConfig::from_json_str(
            r#"{"composition": {"input_node_id": "x", "output_node_id": "x"}}"#
        )
        .is_err());
        assert!(matches!(
            NestflowConfig::from_json_str("{not json"),
            Err(NestflowError::Serialization(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"logging": {{"default_level": "debug", "json": true}}}}"#).unwrap();

        let config = NestflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.default_level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_from_missing_file() {
        let err = NestflowConfig::from_file("/nonexistent/nestflow.json").unwrap_err();
        assert!(matches!(err, NestflowError::Io(_)));
    }
}
