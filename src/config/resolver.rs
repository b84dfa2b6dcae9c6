//! Pluggable value resolvers.
//!
//! A resolver computes the value of one or more configs on demand, e.g. by
//! probing the environment or reading a file. Failures are plain
//! `anyhow::Error`s; the owning config node attaches its name when wrapping them.

use super::value::{ConfigValue, ValueType};
use anyhow::Result;

/// External capability producing a typed value for a named config.
pub trait Resolver {
    /// Compute the raw (not yet interpolated) value of config `name`.
    fn get_value(&self, name: &str) -> Result<ConfigValue>;

    /// Declared type of config `name`; the computed value must match it.
    fn get_type(&self, name: &str) -> Result<ValueType>;

    /// Volatile configs are recomputed on every access.
    fn is_volatile(&self, _name: &str) -> bool {
        false
    }
}

/// Resolver backed by a closure.
pub struct FnResolver<F> {
    value_type: ValueType,
    volatile: bool,
    compute: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> Result<ConfigValue>,
{
    pub fn new(value_type: ValueType, compute: F) -> Self {
        Self {
            value_type,
            volatile: false,
            compute,
        }
    }

    /// Mark every config served by this resolver as volatile.
    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }
}

impl<F> Resolver for FnResolver<F>
where
    F: Fn(&str) -> Result<ConfigValue>,
{
    fn get_value(&self, name: &str) -> Result<ConfigValue> {
        (self.compute)(name)
    }

    fn get_type(&self, _name: &str) -> Result<ValueType> {
        Ok(self.value_type)
    }

    fn is_volatile(&self, _name: &str) -> bool {
        self.volatile
    }
}
