//! Configuration resolution engine.
//!
//! Configs are named nodes held by a [`ConfigRegistry`]:
//! 1. **Static** - literal value captured when the node is created
//! 2. **Resolved** - value computed on demand by a [`Resolver`]
//! 3. **List** / **Dict** - ordered layers deep-merged at resolution time
//!
//! ## Interpolation
//! Any string may reference other configs with `${name}` or `${name.key}`;
//! `${BASE_DIR}` is the directory of the file declaring the value. Resolution
//! is lazy, cached per node, and fails on cyclic references.

mod interpolate;
mod merge;
mod node;
mod registry;
mod resolver;
mod value;

pub use interpolate::{Ancestry, BASE_DIR, Interpolator};
pub use merge::{merge_list_into, merge_lists, merge_map_into, merge_maps};
pub use node::{ConfigNode, Layer, NodeKind};
pub use registry::{ConfigRegistry, ConfigSource};
pub use resolver::{FnResolver, Resolver};
pub use value::{ConfigMap, ConfigValue, ValueType};
