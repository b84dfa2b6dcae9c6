//! Build tasks and their dependency graph.
//!
//! A [`Task`] is declared with dependency names and, optionally, a target it
//! wants to be appended or prepended to as a dependency (a "contribution").
//! Tasks live in a [`TaskGraph`] arena; references between tasks are
//! [`TaskId`]s, so contributions mutate the target through an index.

mod graph;

pub use graph::{TaskGraph, TaskId};

use crate::config::{ConfigRegistry, ConfigValue, ValueType};
use crate::error::{ModelError, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::path::PathBuf;

/// A task reference: one name, or candidate names where the first existing one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskTarget {
    One(String),
    Candidates(Vec<String>),
}

impl TaskTarget {
    /// Names to try, in order.
    pub fn candidates(&self) -> &[String] {
        match self {
            TaskTarget::One(name) => std::slice::from_ref(name),
            TaskTarget::Candidates(names) => names,
        }
    }

    /// Whether this is a plain reference to `name`.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, TaskTarget::One(n) if n == name)
    }
}

impl From<&str> for TaskTarget {
    fn from(name: &str) -> Self {
        TaskTarget::One(name.to_string())
    }
}

impl From<String> for TaskTarget {
    fn from(name: String) -> Self {
        TaskTarget::One(name)
    }
}

impl From<Vec<&str>> for TaskTarget {
    fn from(names: Vec<&str>) -> Self {
        TaskTarget::Candidates(names.into_iter().map(str::to_string).collect())
    }
}

/// A named build step.
///
/// Config-valued fields (`params`, inputs, outputs, guards) hold config names
/// looked up in the [`ConfigRegistry`] when needed.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub silent: bool,
    pub emoji: Option<String>,
    /// Opaque handle naming the builder the executor should run.
    pub builder: Option<String>,
    pub params: Option<String>,
    pub run_if: Option<String>,
    pub run_unless: Option<String>,
    deps: Vec<TaskTarget>,
    append_to: Option<TaskTarget>,
    prepend_to: Option<TaskTarget>,
    inputs_cfg: Option<String>,
    outputs_cfg: Option<String>,
    subtasks: Option<Vec<TaskId>>,
    inputs: OnceCell<Vec<PathBuf>>,
    outputs: OnceCell<Vec<PathBuf>>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            silent: false,
            emoji: None,
            builder: None,
            params: None,
            run_if: None,
            run_unless: None,
            deps: Vec::new(),
            append_to: None,
            prepend_to: None,
            inputs_cfg: None,
            outputs_cfg: None,
            subtasks: None,
            inputs: OnceCell::new(),
            outputs: OnceCell::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn with_builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = Some(builder.into());
        self
    }

    pub fn with_params(mut self, config: impl Into<String>) -> Self {
        self.params = Some(config.into());
        self
    }

    pub fn with_deps<T: Into<TaskTarget>>(mut self, deps: impl IntoIterator<Item = T>) -> Self {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_append_to(mut self, target: impl Into<TaskTarget>) -> Self {
        self.append_to = Some(target.into());
        self
    }

    pub fn with_prepend_to(mut self, target: impl Into<TaskTarget>) -> Self {
        self.prepend_to = Some(target.into());
        self
    }

    pub fn with_inputs(mut self, config: impl Into<String>) -> Self {
        self.inputs_cfg = Some(config.into());
        self
    }

    pub fn with_outputs(mut self, config: impl Into<String>) -> Self {
        self.outputs_cfg = Some(config.into());
        self
    }

    pub fn with_run_if(mut self, config: impl Into<String>) -> Self {
        self.run_if = Some(config.into());
        self
    }

    pub fn with_run_unless(mut self, config: impl Into<String>) -> Self {
        self.run_unless = Some(config.into());
        self
    }

    /// Declared dependencies, including contributed ones once validated.
    pub fn deps(&self) -> &[TaskTarget] {
        &self.deps
    }

    pub fn append_to(&self) -> Option<&TaskTarget> {
        self.append_to.as_ref()
    }

    pub fn prepend_to(&self) -> Option<&TaskTarget> {
        self.prepend_to.as_ref()
    }

    /// Resolved dependencies, index-aligned with [`Task::deps`]; `None` until resolved.
    pub fn subtasks(&self) -> Option<&[TaskId]> {
        self.subtasks.as_deref()
    }

    /// Input files, resolved once from the input list config.
    pub fn inputs(&self, registry: &ConfigRegistry) -> Result<&[PathBuf]> {
        self.files(registry, &self.inputs, self.inputs_cfg.as_deref())
    }

    /// Output files, resolved once from the output list config.
    pub fn outputs(&self, registry: &ConfigRegistry) -> Result<&[PathBuf]> {
        self.files(registry, &self.outputs, self.outputs_cfg.as_deref())
    }

    /// Resolved parameters; empty when the task declares none.
    pub fn resolve_params(&self, registry: &ConfigRegistry) -> Result<crate::config::ConfigMap> {
        let Some(config) = &self.params else {
            return Ok(Default::default());
        };
        match registry.value(config)? {
            ConfigValue::Map(entries) => Ok(entries),
            other => Err(ModelError::ConfigTypeMismatch {
                name: config.clone(),
                got: other.value_type(),
                expected: ValueType::Map,
            }),
        }
    }

    /// Evaluate the run-if/run-unless guards.
    pub fn should_run(&self, registry: &ConfigRegistry) -> Result<bool> {
        if let Some(config) = &self.run_if
            && !registry.value(config)?.is_truthy()
        {
            return Ok(false);
        }
        if let Some(config) = &self.run_unless
            && registry.value(config)?.is_truthy()
        {
            return Ok(false);
        }
        Ok(true)
    }

    fn files<'a>(
        &'a self,
        registry: &ConfigRegistry,
        slot: &'a OnceCell<Vec<PathBuf>>,
        config: Option<&str>,
    ) -> Result<&'a [PathBuf]> {
        if let Some(paths) = slot.get() {
            return Ok(paths);
        }

        let mut paths: IndexSet<PathBuf> = IndexSet::new();
        if let Some(config) = config {
            let items = match registry.value(config)? {
                ConfigValue::List(items) => items,
                other => {
                    return Err(ModelError::ConfigTypeMismatch {
                        name: config.to_string(),
                        got: other.value_type(),
                        expected: ValueType::List,
                    });
                }
            };
            for item in items {
                match item {
                    ConfigValue::String(path) => {
                        paths.insert(PathBuf::from(path));
                    }
                    other => {
                        return Err(ModelError::InvalidFileEntry {
                            task: self.name.clone(),
                            config: config.to_string(),
                            reason: format!("expected a path string, got {}", other.value_type()),
                        });
                    }
                }
            }
        }
        Ok(slot.get_or_init(|| paths.into_iter().collect()))
    }
}
