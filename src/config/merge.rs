//! Deep merge of contributing config layers.
//!
//! Layers are merged in declaration order, later layers on top of earlier ones:
//! - Lists are concatenated and nested lists are flattened in place
//! - Maps are merged recursively: scalar keys of later layers override earlier ones,
//!   nested maps are merged and nested lists are concatenated
//!
//! Values given to these functions are expected to be already interpolated.

use super::value::{ConfigMap, ConfigValue};

/// Append `items` to `out`, flattening nested lists recursively.
///
/// # Example
/// ```
/// use buildgraph::config::{merge_list_into, ConfigValue};
///
/// let mut out = vec![ConfigValue::from("a")];
/// merge_list_into(
///     vec![ConfigValue::List(vec!["b".into(), "c".into()]), "d".into()],
///     &mut out,
/// );
/// assert_eq!(out, vec!["a".into(), "b".into(), "c".into(), "d".into()]);
/// ```
pub fn merge_list_into(items: Vec<ConfigValue>, out: &mut Vec<ConfigValue>) {
    for item in items {
        match item {
            ConfigValue::List(nested) => merge_list_into(nested, out),
            item => out.push(item),
        }
    }
}

/// Merge `overlay` entries into `out`.
///
/// - Map values are merged recursively into the existing map (a non-map is replaced)
/// - List values are appended to the existing list (a non-list is replaced)
/// - Any other value overrides the existing entry
pub fn merge_map_into(overlay: ConfigMap, out: &mut ConfigMap) {
    for (key, value) in overlay {
        match value {
            ConfigValue::Map(nested) => {
                let slot = out
                    .entry(key)
                    .or_insert_with(|| ConfigValue::Map(ConfigMap::new()));
                if !slot.is_map() {
                    *slot = ConfigValue::Map(ConfigMap::new());
                }
                if let ConfigValue::Map(target) = slot {
                    merge_map_into(nested, target);
                }
            }
            ConfigValue::List(nested) => {
                let slot = out
                    .entry(key)
                    .or_insert_with(|| ConfigValue::List(Vec::new()));
                if !slot.is_list() {
                    *slot = ConfigValue::List(Vec::new());
                }
                if let ConfigValue::List(target) = slot {
                    merge_list_into(nested, target);
                }
            }
            scalar => {
                out.insert(key, scalar);
            }
        }
    }
}

/// Merge multiple list layers in order.
pub fn merge_lists(layers: impl IntoIterator<Item = Vec<ConfigValue>>) -> Vec<ConfigValue> {
    layers.into_iter().fold(Vec::new(), |mut out, layer| {
        merge_list_into(layer, &mut out);
        out
    })
}

/// Merge multiple map layers in order, with later layers taking precedence.
pub fn merge_maps(layers: impl IntoIterator<Item = ConfigMap>) -> ConfigMap {
    layers.into_iter().fold(ConfigMap::new(), |mut out, layer| {
        merge_map_into(layer, &mut out);
        out
    })
}
