//! The project model: configs and tasks, plus the built-in configs every
//! project can reference.

use crate::config::{BASE_DIR, ConfigMap, ConfigRegistry, ConfigValue};
use crate::error::{ModelError, Result};
use crate::settings::Settings;
use crate::task::{Task, TaskGraph, TaskId};
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

pub const ROOT_DIR: &str = "ROOT_DIR";
pub const STATE_DIR: &str = "STATE_DIR";
pub const CACHE_DIR: &str = "CACHE_DIR";
pub const PROJECT_DIR: &str = "PROJECT_DIR";
pub const PROJECT_FILES: &str = "PROJECT_FILES";
pub const SEARCH_PATH: &str = "SEARCH_PATH";
pub const ENV: &str = "ENV";

static OVERRIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^ =]+)=(.*)$").expect("valid override pattern"));

/// Configs and tasks of a loaded project.
///
/// The loader populates it, then calls [`Model::validate`] once; after that
/// the model is only queried.
#[derive(Debug)]
pub struct Model {
    pub settings: Settings,
    pub config: ConfigRegistry,
    pub tasks: TaskGraph,
    files: Vec<PathBuf>,
}

impl Model {
    /// Empty model seeded with the built-in configs.
    pub fn new(settings: Settings) -> Self {
        let mut config = ConfigRegistry::new();
        config.add_config(SEARCH_PATH, None, ConfigValue::List(Vec::new()));
        // Placeholder: `${BASE_DIR}` is resolved from the declaring file.
        config.add_config(BASE_DIR, None, "");
        config.add_config(ROOT_DIR, None, settings.root.as_path());
        config.add_config(STATE_DIR, None, settings.state_dir().as_path());
        config.add_config(CACHE_DIR, None, settings.cache_dir().as_path());
        config.add_config(PROJECT_DIR, None, "");
        config.add_config(PROJECT_FILES, None, ConfigValue::List(Vec::new()));
        let env: ConfigMap = std::env::vars()
            .map(|(k, v)| (k, ConfigValue::String(v)))
            .collect();
        config.add_config(ENV, None, env);

        Self {
            settings,
            config,
            tasks: TaskGraph::new(),
            files: Vec::new(),
        }
    }

    /// Register a static config declared by a file in directory `path`.
    pub fn add_config(&mut self, name: &str, path: Option<&Path>, value: impl Into<ConfigValue>) {
        self.config.add_config(name, path, value);
    }

    pub fn add_task(&mut self, task: Task) -> TaskId {
        self.tasks.add_task(task)
    }

    /// Record a loaded project file. The first one sets `PROJECT_DIR`.
    pub fn add_project_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.files.contains(&path) {
            return;
        }
        if self.files.is_empty()
            && let Some(dir) = path.parent()
        {
            self.config.add_config(PROJECT_DIR, None, dir);
        }
        self.files.push(path);
    }

    /// Rewrite `PROJECT_FILES` once every file is loaded.
    pub fn refresh_project_files(&mut self) {
        debug!(files = self.files.len(), "updating {} now that all files are loaded", PROJECT_FILES);
        let files = self
            .files
            .iter()
            .map(|p| ConfigValue::from(p.as_path()))
            .collect::<Vec<_>>();
        self.config.add_config(PROJECT_FILES, None, ConfigValue::List(files));
    }

    /// Override configs from `--config`-style strings.
    ///
    /// Each entry is either a JSON object (`{"a": 1}`) whose keys all become
    /// configs, or a `NAME=value` string config.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) -> Result<()> {
        for input in overrides {
            let input = input.as_ref();
            let entries = parse_override(input)?;
            debug!(input, "overriding config from command line");
            for (name, value) in entries {
                self.config.add_config(&name, None, value);
            }
        }
        Ok(())
    }

    /// Assemble the task graph; call once after population.
    pub fn validate(&mut self) -> Result<()> {
        self.tasks.validate_all()
    }
}

fn parse_override(input: &str) -> Result<ConfigMap> {
    if input.starts_with('{') {
        let json: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| ModelError::invalid_override(input, format!("invalid JSON fragment: {}", e)))?;
        return match ConfigValue::try_from(json) {
            Ok(ConfigValue::Map(entries)) => Ok(entries),
            Ok(_) => Err(ModelError::invalid_override(input, "JSON fragment is not an object")),
            Err(reason) => Err(ModelError::invalid_override(input, reason)),
        };
    }

    let caps = OVERRIDE
        .captures(input)
        .ok_or_else(|| ModelError::invalid_override(input, "neither a JSON object nor a K=V string"))?;
    let mut entries = ConfigMap::new();
    if let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) {
        entries.insert(name.as_str().to_string(), ConfigValue::from(value.as_str()));
    }
    Ok(entries)
}
