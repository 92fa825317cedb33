//! Building a nested task and the metadata the outer circuit consumes.

use super::detect::{is_nestable, CompatibilityRegistry, DefaultNestableCheck, NestableCheck};
use super::input::{Derivation, InputMapper};
use super::output::{MergeStrategy, OutputMapper};
use crate::activity::{Activity, Direction, Invocation, NonActivity, Operand, Role, TerminalEvent};
use crate::config::CompositionConfig;
use crate::context::{Context, FlowOptions};
use crate::errors::{ConfigurationError, NestflowError};
use crate::wiring::{Anchor, WiringInstruction, CALL_TASK};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The outer-facing description of one inner end event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    /// The role the end plays for the outer circuit.
    pub role: Role,
}

/// Maps every end event of a nested activity to its role, by identity.
#[derive(Debug, Clone, Default)]
pub struct TerminalRoleMap {
    entries: IndexMap<TerminalEvent, RoleRecord>,
}

impl TerminalRoleMap {
    /// Builds the map from an activity's end events.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an empty or duplicated end event set.
    pub fn from_end_events(task: &str, events: &[TerminalEvent]) -> Result<Self, ConfigurationError> {
        if events.is_empty() {
            return Err(ConfigurationError::no_end_events(task));
        }

        let mut entries = IndexMap::with_capacity(events.len());
        for event in events {
            let record = RoleRecord {
                role: event.role().clone(),
            };
            if entries.insert(event.clone(), record).is_some() {
                return Err(ConfigurationError::duplicate_end_event(task, event.name()));
            }
        }

        Ok(Self { entries })
    }

    /// Looks up the role of an end event.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the event is not mapped.
    pub fn role_for(&self, task: &str, event: &TerminalEvent) -> Result<&RoleRecord, ConfigurationError> {
        self.entries
            .get(event)
            .ok_or_else(|| ConfigurationError::unmapped_end_event(task, event.name()))
    }

    /// Gets the record of an end event.
    #[must_use]
    pub fn get(&self, event: &TerminalEvent) -> Option<&RoleRecord> {
        self.entries.get(event)
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TerminalEvent, &RoleRecord)> {
        self.entries.iter()
    }

    /// Returns the mapped roles in declaration order.
    #[must_use]
    pub fn roles(&self) -> Vec<&Role> {
        self.entries.values().map(|record| &record.role).collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Descriptive metadata of a composed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskMetadata {
    /// The task name.
    pub name: String,
}

/// Circuit-level task delegating to the resolved nested activity.
#[derive(Debug)]
pub struct NestedTask {
    name: String,
    activity: Arc<dyn Activity>,
}

impl NestedTask {
    /// Returns the resolved activity.
    #[must_use]
    pub fn activity(&self) -> &Arc<dyn Activity> {
        &self.activity
    }
}

impl Activity for NestedTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn end_events(&self) -> &[TerminalEvent] {
        self.activity.end_events()
    }

    fn invoke(
        &self,
        start_at: Direction,
        ctx: Context,
        flow_options: FlowOptions,
    ) -> Result<Invocation, NestflowError> {
        debug!(task = %self.name, activity = %self.activity.name(), "Invoking nested activity");
        self.activity.invoke(start_at, ctx, flow_options)
    }
}

/// Everything the outer assembler needs to splice a nested activity in.
#[derive(Debug)]
pub struct Composition {
    /// The circuit-level task.
    pub task: Arc<NestedTask>,
    /// Task metadata.
    pub metadata: TaskMetadata,
    /// Task wrap edits, to be applied in order.
    pub wiring: Vec<WiringInstruction>,
    /// Role of every end event the task can finish in.
    pub outputs: TerminalRoleMap,
}

enum OutputSetting {
    Default,
    Strategy(Arc<dyn MergeStrategy>),
    Disabled,
}

/// Uses a nestable operand directly and adapts anything else.
///
/// # Errors
///
/// Propagates detection errors other than `Incomparable`, and rejects dynamic
/// operands the check claims are nestable.
pub fn resolve_activity(
    operand: Operand,
    check: &dyn NestableCheck,
) -> Result<Arc<dyn Activity>, NestflowError> {
    if is_nestable(check, &operand)? {
        return match operand {
            Operand::Activity(activity) => Ok(activity),
            Operand::Dynamic { name, .. } => Err(ConfigurationError::not_an_activity(name).into()),
        };
    }
    debug!(operand = %operand.name(), "Adapting operand to success/failure ends");
    Ok(Arc::new(NonActivity::new(operand)))
}

/// Builder composing an operand into a nested task.
///
/// ```rust,ignore
/// let composition = Nested::new(Operand::activity(inner))
///     .input(|ctx, _| ctx.wrap())
///     .build()?;
/// ```
pub struct Nested {
    operand: Operand,
    input: Option<Derivation>,
    output: OutputSetting,
    name: Option<String>,
    check: Option<Arc<dyn NestableCheck>>,
    config: CompositionConfig,
}

impl Nested {
    /// Starts composing an operand.
    #[must_use]
    pub fn new(operand: Operand) -> Self {
        Self {
            operand,
            input: None,
            output: OutputSetting::Default,
            name: None,
            check: None,
            config: CompositionConfig::default(),
        }
    }

    /// Derives the inner context from the outer one.
    #[must_use]
    pub fn input<F>(mut self, derive: F) -> Self
    where
        F: Fn(&Context, &FlowOptions) -> Context + Send + Sync + 'static,
    {
        self.input = Some(Arc::new(derive));
        self
    }

    /// Merges the nested result back with the given strategy.
    #[must_use]
    pub fn output(mut self, strategy: Arc<dyn MergeStrategy>) -> Self {
        self.output = OutputSetting::Strategy(strategy);
        self
    }

    /// Lets the nested result replace the outer context.
    #[must_use]
    pub fn without_output(mut self) -> Self {
        self.output = OutputSetting::Disabled;
        self
    }

    /// Sets the task name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the nestable check.
    #[must_use]
    pub fn nestable_check(mut self, check: impl NestableCheck + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    /// Applies a composition config.
    #[must_use]
    pub fn with_config(mut self, config: CompositionConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the composition.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the resolved activity has no end
    /// events, and propagates detection errors.
    pub fn build(self) -> Result<Composition, NestflowError> {
        let Self {
            operand,
            input,
            output,
            name,
            check,
            config,
        } = self;

        let name = name.unwrap_or_else(|| format!("Nested({})", operand.name()));
        let check = check.unwrap_or_else(|| {
            Arc::new(DefaultNestableCheck::new(CompatibilityRegistry::from_bases(
                config.compatible_bases.iter().cloned(),
            )))
        });

        let activity = resolve_activity(operand, check.as_ref())?;
        let outputs = TerminalRoleMap::from_end_events(&name, activity.end_events())?;

        let strategy = merge_strategy(&name, &config, input.is_some(), output);
        let input_mapper = match (input, &strategy) {
            (Some(derive), _) => Some(InputMapper::from_derivation(derive)),
            (None, Some(_)) => Some(InputMapper::scoped()),
            (None, None) => None,
        };

        let mut wiring = Vec::new();
        if let Some(mapper) = input_mapper {
            wiring.push(WiringInstruction::insert_before(
                Anchor::node(CALL_TASK),
                config.input_node_id.clone(),
                Arc::new(mapper),
            ));
        }
        if let Some(strategy) = strategy {
            wiring.push(WiringInstruction::insert_before(
                Anchor::default_end(),
                config.output_node_id.clone(),
                Arc::new(OutputMapper::new(config.output_node_id.clone(), strategy)),
            ));
        }

        debug!(
            task = %name,
            activity = %activity.name(),
            end_events = outputs.len(),
            wiring = wiring.len(),
            "Composed nested task"
        );

        Ok(Composition {
            task: Arc::new(NestedTask {
                name: name.clone(),
                activity,
            }),
            metadata: TaskMetadata { name },
            wiring,
            outputs,
        })
    }
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nested")
            .field("operand", &self.operand)
            .field("name", &self.name)
            .field("has_input", &self.input.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn merge_strategy(
    task: &str,
    config: &CompositionConfig,
    has_input: bool,
    output: OutputSetting,
) -> Option<Arc<dyn MergeStrategy>> {
    match output {
        OutputSetting::Disabled => None,
        OutputSetting::Default => has_input.then(|| config.merge_strategy.build()),
        OutputSetting::Strategy(strategy) if has_input || !config.couple_output_to_input => {
            Some(strategy)
        }
        OutputSetting::Strategy(_) => {
            warn!(task = %task, "Output strategy ignored: output mapping is coupled to input mapping");
            None
        }
    }
}
