//! Config registry: the name → node table every interpolation looks through.

use super::interpolate::Ancestry;
use super::node::{ConfigNode, NodeKind};
use super::resolver::Resolver;
use super::value::{ConfigMap, ConfigValue};
use crate::error::{ModelError, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// What a new config is built from.
pub enum ConfigSource {
    Value(ConfigValue),
    Resolver(Rc<dyn Resolver>),
}

impl From<ConfigValue> for ConfigSource {
    fn from(value: ConfigValue) -> Self {
        ConfigSource::Value(value)
    }
}

impl From<Rc<dyn Resolver>> for ConfigSource {
    fn from(resolver: Rc<dyn Resolver>) -> Self {
        ConfigSource::Resolver(resolver)
    }
}

/// Registry of config nodes, in registration order.
///
/// Re-adding a name replaces the previous node. The `path` given to the
/// `add_*` methods is the directory of the file declaring the value; it is
/// what `${BASE_DIR}` expands to.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    nodes: IndexMap<String, ConfigNode>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a static or resolved config.
    pub fn add_source(
        &mut self,
        name: &str,
        path: Option<&Path>,
        source: impl Into<ConfigSource>,
    ) -> &ConfigNode {
        let path = path.map(Path::to_path_buf);
        let node = match source.into() {
            ConfigSource::Value(value) => ConfigNode::new_static(name, path, value),
            ConfigSource::Resolver(resolver) => ConfigNode::new_resolved(name, path, resolver),
        };
        self.insert(node)
    }

    /// Create or replace a static config.
    pub fn add_config(
        &mut self,
        name: &str,
        path: Option<&Path>,
        value: impl Into<ConfigValue>,
    ) -> &ConfigNode {
        self.add_source(name, path, ConfigSource::Value(value.into()))
    }

    /// Create or replace a config computed by `resolver`.
    pub fn add_resolved(
        &mut self,
        name: &str,
        path: Option<&Path>,
        resolver: Rc<dyn Resolver>,
    ) -> &ConfigNode {
        self.add_source(name, path, ConfigSource::Resolver(resolver))
    }

    /// Contribute items to a merged list config.
    ///
    /// Items are appended as a new layer if `name` is already a list config,
    /// otherwise a new list config replaces whatever was registered.
    pub fn add_list(&mut self, name: &str, path: Option<&Path>, items: Vec<ConfigValue>) -> &ConfigNode {
        let path = path.map(Path::to_path_buf);
        if let Some(node) = self.nodes.get_mut(name)
            && matches!(node.kind(), NodeKind::List(_))
        {
            node.extend_list(path, items);
            debug!(config = name, "extended list config");
            return &self.nodes[name];
        }
        self.insert(ConfigNode::new_list(name, path, items))
    }

    /// Contribute entries to a merged dict config.
    ///
    /// Entries are merged as a new layer if `name` is already a dict config,
    /// otherwise a new dict config replaces whatever was registered.
    pub fn add_dict(&mut self, name: &str, path: Option<&Path>, entries: ConfigMap) -> &ConfigNode {
        let path = path.map(Path::to_path_buf);
        if let Some(node) = self.nodes.get_mut(name)
            && matches!(node.kind(), NodeKind::Dict(_))
        {
            node.extend_dict(path, entries);
            debug!(config = name, "extended dict config");
            return &self.nodes[name];
        }
        self.insert(ConfigNode::new_dict(name, path, entries))
    }

    /// Register a prebuilt node, replacing any node with the same name.
    pub fn insert(&mut self, node: ConfigNode) -> &ConfigNode {
        let name = node.name().to_string();
        if self.nodes.contains_key(&name) {
            debug!(config = %name, kind = %node_kind(&node), "overriding config");
        }
        self.nodes.insert(name.clone(), node);
        &self.nodes[&name]
    }

    pub fn get(&self, name: &str) -> Option<&ConfigNode> {
        self.nodes.get(name)
    }

    /// Config names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Cached value of config `name`.
    pub fn value(&self, name: &str) -> Result<ConfigValue> {
        self.resolve(name, true)
    }

    /// Resolve config `name` with explicit cache control.
    pub fn resolve(&self, name: &str, use_cache: bool) -> Result<ConfigValue> {
        let node = self
            .get(name)
            .ok_or_else(|| ModelError::unknown_config(name, None))?;
        node.resolve(self, use_cache, &Ancestry::new())
    }
}

fn node_kind(node: &ConfigNode) -> &'static str {
    match node.kind() {
        NodeKind::Static(_) => "static",
        NodeKind::Resolved(_) => "resolved",
        NodeKind::List(_) => "list",
        NodeKind::Dict(_) => "dict",
    }
}
