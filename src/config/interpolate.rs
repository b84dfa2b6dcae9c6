//! `${...}` reference interpolation.
//!
//! Strings are scanned for `${name}` or `${name.key.key}` tokens; each token
//! is replaced by the resolved value of the referenced config. Lists and maps
//! are interpolated element-wise, other scalars pass through unchanged.
//!
//! A string made of exactly one token yields the referenced value as is, so
//! `"${items}"` can produce a list or a map rather than its string form.

use super::registry::ConfigRegistry;
use super::value::{ConfigMap, ConfigValue};
use crate::error::{ModelError, Result};
use regex_lite::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// Reserved token resolving to the directory of the file declaring the value.
pub const BASE_DIR: &str = "BASE_DIR";

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^ \}]+)\}").expect("valid reference pattern"));

/// Names of the configs currently being resolved on the active call chain.
///
/// Each nested resolution works on its own enlarged copy, so sibling branches
/// never see each other's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry(HashSet<String>);

impl Ancestry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Copy of this ancestry with `name` added.
    pub fn with(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.insert(name.to_string());
        Self(names)
    }
}

/// Interpolation context for one config node.
pub struct Interpolator<'a> {
    registry: &'a ConfigRegistry,
    owner: &'a str,
    base_dir: Option<&'a Path>,
    use_cache: bool,
    ancestry: Ancestry,
}

impl<'a> Interpolator<'a> {
    /// Build the context used while interpolating values of config `owner`.
    ///
    /// `owner` is added to `ancestry` so any reference back to it is a cycle.
    pub fn new(
        registry: &'a ConfigRegistry,
        owner: &'a str,
        base_dir: Option<&'a Path>,
        use_cache: bool,
        ancestry: &Ancestry,
    ) -> Self {
        Self {
            registry,
            owner,
            base_dir,
            use_cache,
            ancestry: ancestry.with(owner),
        }
    }

    /// Same context, with `BASE_DIR` pointing to another declaring path.
    pub fn with_base_dir(&self, base_dir: Option<&'a Path>) -> Self {
        Self {
            registry: self.registry,
            owner: self.owner,
            base_dir,
            use_cache: self.use_cache,
            ancestry: self.ancestry.clone(),
        }
    }

    pub fn format(&self, candidate: &ConfigValue) -> Result<ConfigValue> {
        match candidate {
            ConfigValue::List(items) => items
                .iter()
                .map(|item| self.format(item))
                .collect::<Result<Vec<_>>>()
                .map(ConfigValue::List),
            ConfigValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| self.format(v).map(|v| (k.clone(), v)))
                .collect::<Result<ConfigMap>>()
                .map(ConfigValue::Map),
            ConfigValue::String(s) => self.format_str(s),
            scalar => Ok(scalar.clone()),
        }
    }

    fn format_str(&self, candidate: &str) -> Result<ConfigValue> {
        let mut to_format = candidate.to_string();
        loop {
            let Some((span, reference)) = REFERENCE
                .captures(&to_format)
                .and_then(|caps| {
                    let whole = caps.get(0)?;
                    Some((whole.start()..whole.end(), caps.get(1)?.as_str().to_string()))
                })
            else {
                return Ok(ConfigValue::String(to_format));
            };

            let ref_value = self.lookup(&reference)?;

            if span.len() == to_format.len() && !ref_value.is_string() {
                return Ok(ref_value);
            }

            to_format.replace_range(span, &ref_value.to_string());
        }
    }

    fn lookup(&self, reference: &str) -> Result<ConfigValue> {
        if reference == BASE_DIR {
            let dir = self
                .base_dir
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return Ok(ConfigValue::String(dir));
        }

        let (name, segments) = match reference.split_once('.') {
            Some((name, rest)) => (name, Some(rest)),
            None => (reference, None),
        };

        if self.ancestry.contains(name) {
            return Err(ModelError::CyclicReference {
                name: name.to_string(),
                from: self.owner.to_string(),
            });
        }
        let node = self
            .registry
            .get(name)
            .ok_or_else(|| ModelError::unknown_config(name, Some(self.owner)))?;

        trace!(config = %self.owner, reference, "resolving reference");
        let value = node.resolve(self.registry, self.use_cache, &self.ancestry)?;

        match segments {
            Some(path) => self.walk(reference, value, path),
            None => Ok(value),
        }
    }

    fn walk(&self, reference: &str, value: ConfigValue, path: &str) -> Result<ConfigValue> {
        let mut current = value;
        for segment in path.split('.') {
            let ConfigValue::Map(mut entries) = current else {
                return Err(ModelError::invalid_dot_path(
                    reference,
                    self.owner,
                    format!("value is not a dict before '{}'", segment),
                ));
            };
            if segment.is_empty() {
                return Err(ModelError::invalid_dot_path(
                    reference,
                    self.owner,
                    "empty segment",
                ));
            }
            current = entries.swap_remove(segment).ok_or_else(|| {
                ModelError::invalid_dot_path(
                    reference,
                    self.owner,
                    format!("unknown dict key '{}'", segment),
                )
            })?;
        }
        Ok(current)
    }
}
