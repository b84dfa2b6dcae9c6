//! Configuration value types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered string-keyed map of values. Insertion order is kept so merged
/// dictionaries stay deterministic.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// A resolved (or raw, not yet interpolated) configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

/// The variant a config node is declared to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    Integer,
    String,
    List,
    Map,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "bool"),
            ValueType::Integer => write!(f, "int"),
            ValueType::String => write!(f, "str"),
            ValueType::List => write!(f, "list"),
            ValueType::Map => write!(f, "dict"),
        }
    }
}

impl ConfigValue {
    /// Runtime variant of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            ConfigValue::Boolean(_) => ValueType::Boolean,
            ConfigValue::Integer(_) => ValueType::Integer,
            ConfigValue::String(_) => ValueType::String,
            ConfigValue::List(_) => ValueType::List,
            ConfigValue::Map(_) => ValueType::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ConfigValue::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ConfigValue::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// Truthiness used by task guards: empty strings, zero, `false` and empty
    /// containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Boolean(b) => *b,
            ConfigValue::Integer(i) => *i != 0,
            ConfigValue::String(s) => !s.is_empty(),
            ConfigValue::List(items) => !items.is_empty(),
            ConfigValue::Map(entries) => !entries.is_empty(),
        }
    }
}

/// Stringification used when a reference is spliced into a larger string.
///
/// Containers render as compact JSON.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Boolean(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::List(_) | ConfigValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Integer(i64::from(i))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Boolean(b)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(entries: ConfigMap) -> Self {
        ConfigValue::Map(entries)
    }
}

impl From<&std::path::Path> for ConfigValue {
    fn from(path: &std::path::Path) -> Self {
        ConfigValue::String(path.display().to_string())
    }
}

/// Conversion from JSON fragments (e.g. command-line overrides).
///
/// Nulls and non-integer numbers have no config representation.
impl TryFrom<serde_json::Value> for ConfigValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::Null => Err("null values are not supported".to_string()),
            Value::Bool(b) => Ok(ConfigValue::Boolean(b)),
            Value::Number(n) => n
                .as_i64()
                .map(ConfigValue::Integer)
                .ok_or_else(|| format!("unsupported number: {}", n)),
            Value::String(s) => Ok(ConfigValue::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(ConfigValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ConfigValue::List),
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| ConfigValue::try_from(v).map(|v| (k, v)))
                .collect::<Result<ConfigMap, _>>()
                .map(ConfigValue::Map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_matches_variant() {
        assert_eq!(ConfigValue::from("a").value_type(), ValueType::String);
        assert_eq!(ConfigValue::from(3).value_type(), ValueType::Integer);
        assert_eq!(ConfigValue::from(true).value_type(), ValueType::Boolean);
        assert_eq!(ConfigValue::List(vec![]).value_type(), ValueType::List);
        assert_eq!(ConfigValue::Map(ConfigMap::new()).value_type(), ValueType::Map);
    }

    #[test]
    fn test_display_scalars_and_containers() {
        assert_eq!(ConfigValue::from("abc").to_string(), "abc");
        assert_eq!(ConfigValue::from(42).to_string(), "42");
        assert_eq!(ConfigValue::from(false).to_string(), "false");
        let list = ConfigValue::List(vec![1.into(), "x".into()]);
        assert_eq!(list.to_string(), r#"[1,"x"]"#);
    }

    #[test]
    fn test_from_json_fragment() {
        let value = ConfigValue::try_from(json!({"b": 1, "a": [true, "s"]})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["b"], ConfigValue::from(1));
        assert_eq!(
            map["a"],
            ConfigValue::List(vec![true.into(), "s".into()])
        );
    }

    #[test]
    fn test_from_json_rejects_null_and_floats() {
        assert!(ConfigValue::try_from(json!(null)).is_err());
        assert!(ConfigValue::try_from(json!([1.5])).is_err());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let value: ConfigValue = serde_yaml::from_str("name: x\nitems: [1, 2]\nflag: true\n").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["name"], ConfigValue::from("x"));
        assert_eq!(map["items"], ConfigValue::List(vec![1.into(), 2.into()]));
        assert_eq!(map["flag"], ConfigValue::from(true));
    }

    #[test]
    fn test_truthiness() {
        assert!(!ConfigValue::from("").is_truthy());
        assert!(ConfigValue::from("x").is_truthy());
        assert!(!ConfigValue::from(0).is_truthy());
        assert!(!ConfigValue::List(vec![]).is_truthy());
        assert!(ConfigValue::from(true).is_truthy());
    }
}
