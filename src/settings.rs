//! Loader settings.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default settings file, looked up in the current directory.
pub const SETTINGS_FILE: &str = "buildgraph.yaml";

/// Settings of the model loader: where the project root and the state
/// directories live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Project root directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// State directory (default: `<root>/.buildgraph`).
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Cache directory for fetched project files (default: `<state_dir>/cache`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: default_root(),
            state_dir: None,
            cache_dir: None,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Settings {
    /// Settings rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings_error = |source: anyhow::Error| ModelError::Settings {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(|e| settings_error(e.into()))?;
        serde_yaml::from_str(&content).map_err(|e| settings_error(e.into()))
    }

    /// Load settings from [`SETTINGS_FILE`], or build them from the environment.
    pub fn load_or_default() -> Self {
        if let Ok(settings) = Self::load(SETTINGS_FILE) {
            return settings;
        }

        let mut settings = Self::default();

        if let Ok(root) = std::env::var("BUILDGRAPH_ROOT") {
            settings.root = PathBuf::from(root);
        }

        if let Ok(state_dir) = std::env::var("BUILDGRAPH_STATE_DIR") {
            settings.state_dir = Some(PathBuf::from(state_dir));
        }

        if let Ok(cache_dir) = std::env::var("BUILDGRAPH_CACHE_DIR") {
            settings.cache_dir = Some(PathBuf::from(cache_dir));
        }

        settings
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.root.join(".buildgraph"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.state_dir().join("cache"))
    }
}
