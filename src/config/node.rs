//! Config nodes: named, typed, resolvable configuration entries.

use super::interpolate::{Ancestry, Interpolator};
use super::merge::{merge_lists, merge_maps};
use super::registry::ConfigRegistry;
use super::resolver::Resolver;
use super::value::{ConfigMap, ConfigValue, ValueType};
use crate::error::{ModelError, Result};
use regex_lite::Regex;
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::trace;

static FINAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("valid final name pattern"));

/// One contribution to a merged config.
///
/// `path` is the directory of the file declaring the contribution, used as
/// `${BASE_DIR}` while interpolating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
    pub path: Option<PathBuf>,
    pub value: T,
}

/// Node variants.
pub enum NodeKind {
    /// Literal value captured at creation time.
    Static(ConfigValue),
    /// Value computed on demand by a resolver.
    Resolved(Rc<dyn Resolver>),
    /// Ordered list layers, concatenated.
    List(Vec<Layer<Vec<ConfigValue>>>),
    /// Ordered dict layers, deep-merged.
    Dict(Vec<Layer<ConfigMap>>),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Static(value) => f.debug_tuple("Static").field(value).finish(),
            NodeKind::Resolved(_) => f.write_str("Resolved(..)"),
            NodeKind::List(layers) => f.debug_tuple("List").field(layers).finish(),
            NodeKind::Dict(layers) => f.debug_tuple("Dict").field(layers).finish(),
        }
    }
}

/// A named configuration entry.
///
/// The resolved value is cached on first cached resolution; nodes served by a
/// volatile resolver are never cached.
#[derive(Debug)]
pub struct ConfigNode {
    name: String,
    path: Option<PathBuf>,
    kind: NodeKind,
    cached: OnceCell<ConfigValue>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            path,
            kind,
            cached: OnceCell::new(),
        }
    }

    pub fn new_static(name: impl Into<String>, path: Option<PathBuf>, value: ConfigValue) -> Self {
        Self::new(name, path, NodeKind::Static(value))
    }

    pub fn new_resolved(
        name: impl Into<String>,
        path: Option<PathBuf>,
        resolver: Rc<dyn Resolver>,
    ) -> Self {
        Self::new(name, path, NodeKind::Resolved(resolver))
    }

    pub fn new_list(name: impl Into<String>, path: Option<PathBuf>, items: Vec<ConfigValue>) -> Self {
        let layer = Layer {
            path: path.clone(),
            value: items,
        };
        Self::new(name, path, NodeKind::List(vec![layer]))
    }

    pub fn new_dict(name: impl Into<String>, path: Option<PathBuf>, entries: ConfigMap) -> Self {
        let layer = Layer {
            path: path.clone(),
            value: entries,
        };
        Self::new(name, path, NodeKind::Dict(vec![layer]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of the file that declared this config (the `${BASE_DIR}` of
    /// its value), not the file itself.
    pub fn declaring_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether the name is all uppercase letters, digits and underscores.
    ///
    /// Enforcement (e.g. refusing overrides) is left to the loader.
    pub fn is_final(&self) -> bool {
        FINAL_NAME.is_match(&self.name)
    }

    /// Declared type of the value this node produces.
    pub fn value_type(&self) -> Result<ValueType> {
        match &self.kind {
            NodeKind::Static(value) => Ok(value.value_type()),
            NodeKind::Resolved(resolver) => resolver
                .get_type(&self.name)
                .map_err(|e| ModelError::resolver_failure(&self.name, e)),
            NodeKind::List(_) => Ok(ValueType::List),
            NodeKind::Dict(_) => Ok(ValueType::Map),
        }
    }

    /// Add a contribution on top of the existing list layers.
    ///
    /// Returns false (and leaves the node untouched) if this is not a list node.
    pub fn extend_list(&mut self, path: Option<PathBuf>, items: Vec<ConfigValue>) -> bool {
        match &mut self.kind {
            NodeKind::List(layers) => {
                layers.push(Layer { path, value: items });
                self.cached = OnceCell::new();
                true
            }
            _ => false,
        }
    }

    /// Add a contribution on top of the existing dict layers.
    ///
    /// Returns false (and leaves the node untouched) if this is not a dict node.
    pub fn extend_dict(&mut self, path: Option<PathBuf>, entries: ConfigMap) -> bool {
        match &mut self.kind {
            NodeKind::Dict(layers) => {
                layers.push(Layer {
                    path,
                    value: entries,
                });
                self.cached = OnceCell::new();
                true
            }
            _ => false,
        }
    }

    /// Cached, fully interpolated value.
    pub fn value(&self, registry: &ConfigRegistry) -> Result<ConfigValue> {
        self.resolve(registry, true, &Ancestry::new())
    }

    /// Resolve this node.
    ///
    /// With `use_cache`, a previously cached value is returned as is. Otherwise
    /// the value is computed, and cached if `use_cache` still holds after the
    /// volatility check.
    pub fn resolve(
        &self,
        registry: &ConfigRegistry,
        use_cache: bool,
        ancestry: &Ancestry,
    ) -> Result<ConfigValue> {
        let use_cache = match &self.kind {
            NodeKind::Resolved(resolver) => use_cache && !resolver.is_volatile(&self.name),
            _ => use_cache,
        };

        if use_cache && let Some(value) = self.cached.get() {
            return Ok(value.clone());
        }

        let value = self.get_value(registry, use_cache, ancestry)?;
        if use_cache {
            let _ = self.cached.set(value.clone());
        }
        Ok(value)
    }

    fn get_value(
        &self,
        registry: &ConfigRegistry,
        use_cache: bool,
        ancestry: &Ancestry,
    ) -> Result<ConfigValue> {
        trace!(config = %self.name, use_cache, "computing config value");
        let interpolator = Interpolator::new(
            registry,
            &self.name,
            self.declaring_path(),
            use_cache,
            ancestry,
        );

        match &self.kind {
            NodeKind::Static(value) => interpolator.format(value),
            NodeKind::Resolved(resolver) => {
                let value = resolver
                    .get_value(&self.name)
                    .map_err(|e| ModelError::resolver_failure(&self.name, e))?;
                let expected = self.value_type()?;
                let got = value.value_type();
                if got != expected {
                    return Err(ModelError::ResolverTypeMismatch {
                        name: self.name.clone(),
                        got,
                        expected,
                    });
                }
                interpolator.format(&value)
            }
            NodeKind::List(layers) => {
                let formatted = layers
                    .iter()
                    .map(|layer| {
                        let layer_fmt = interpolator.with_base_dir(layer.path.as_deref());
                        layer
                            .value
                            .iter()
                            .map(|item| layer_fmt.format(item))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConfigValue::List(merge_lists(formatted)))
            }
            NodeKind::Dict(layers) => {
                let formatted = layers
                    .iter()
                    .map(|layer| {
                        let layer_fmt = interpolator.with_base_dir(layer.path.as_deref());
                        layer
                            .value
                            .iter()
                            .map(|(k, v)| layer_fmt.format(v).map(|v| (k.clone(), v)))
                            .collect::<Result<ConfigMap>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConfigValue::Map(merge_maps(formatted)))
            }
        }
    }
}
