//! Structured error types for model resolution and graph assembly.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Config resolution errors
    CyclicReference,
    UnknownConfig,
    InvalidDotPath,
    ResolverTypeMismatch,
    ResolverFailure,
    ConfigTypeMismatch,

    // Task graph errors
    TaskResolution,
    TaskCycle,
    InvalidFileEntry,

    // Loader-side errors
    InvalidOverride,
    InvalidSettings,
}

/// Every failure the model can report.
///
/// All of them are terminal for the current resolution call; nothing is
/// retried or suppressed inside the model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cyclic string substitution: resolving (again!) '{name}' config from '{from}' config")]
    CyclicReference { name: String, from: String },

    #[error("unknown '{name}' config{}", referenced_by(.from))]
    UnknownConfig { name: String, from: Option<String> },

    #[error("invalid dotted reference '{reference}' from '{from}' config: {reason}")]
    InvalidDotPath {
        reference: String,
        from: String,
        reason: String,
    },

    #[error("invalid type returned by resolver for config '{name}': got {got}, expecting {expected}")]
    ResolverTypeMismatch {
        name: String,
        got: crate::config::ValueType,
        expected: crate::config::ValueType,
    },

    #[error("error occurred while resolving config '{name}': {source}")]
    ResolverFailure {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("'{name}' config resolved to {got}, expecting {expected}")]
    ConfigTypeMismatch {
        name: String,
        got: crate::config::ValueType,
        expected: crate::config::ValueType,
    },

    #[error("can't find any of candidates ({}) referenced by '{task}' task", .candidates.join(", "))]
    TaskResolution {
        task: String,
        candidates: Vec<String>,
    },

    #[error("cyclic task dependency: '{task}' depends on itself")]
    TaskCycle { task: String },

    #[error("invalid entry in '{config}' file list of '{task}' task: {reason}")]
    InvalidFileEntry {
        task: String,
        config: String,
        reason: String,
    },

    #[error("invalid config override '{input}': {reason}")]
    InvalidOverride { input: String, reason: String },

    #[error("invalid settings file {}: {source}", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

fn referenced_by(from: &Option<String>) -> String {
    match from {
        Some(from) => format!(" referenced from '{}' config", from),
        None => String::new(),
    }
}

impl ModelError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ModelError::CyclicReference { .. } => ErrorCode::CyclicReference,
            ModelError::UnknownConfig { .. } => ErrorCode::UnknownConfig,
            ModelError::InvalidDotPath { .. } => ErrorCode::InvalidDotPath,
            ModelError::ResolverTypeMismatch { .. } => ErrorCode::ResolverTypeMismatch,
            ModelError::ResolverFailure { .. } => ErrorCode::ResolverFailure,
            ModelError::ConfigTypeMismatch { .. } => ErrorCode::ConfigTypeMismatch,
            ModelError::TaskResolution { .. } => ErrorCode::TaskResolution,
            ModelError::TaskCycle { .. } => ErrorCode::TaskCycle,
            ModelError::InvalidFileEntry { .. } => ErrorCode::InvalidFileEntry,
            ModelError::InvalidOverride { .. } => ErrorCode::InvalidOverride,
            ModelError::Settings { .. } => ErrorCode::InvalidSettings,
        }
    }

    // Convenience constructors

    pub fn unknown_config(name: &str, from: Option<&str>) -> Self {
        ModelError::UnknownConfig {
            name: name.to_string(),
            from: from.map(str::to_string),
        }
    }

    pub fn invalid_dot_path(reference: &str, from: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidDotPath {
            reference: reference.to_string(),
            from: from.to_string(),
            reason: reason.into(),
        }
    }

    pub fn resolver_failure(name: &str, source: anyhow::Error) -> Self {
        ModelError::ResolverFailure {
            name: name.to_string(),
            source,
        }
    }

    pub fn invalid_override(input: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidOverride {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
