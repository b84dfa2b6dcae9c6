//! Build Graph Model Library
//!
//! Lazily resolved configuration graph and task dependency graph for a
//! declarative build orchestration tool. Loading project files and running
//! builders are left to the embedding tool.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod settings;
pub mod task;

pub use config::{ConfigNode, ConfigRegistry, ConfigValue, Resolver, ValueType};
pub use error::{ErrorCode, ModelError, Result};
pub use model::Model;
pub use settings::Settings;
pub use task::{Task, TaskGraph, TaskId, TaskTarget};
