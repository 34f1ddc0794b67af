//! Recursive structural merge of configuration layers.
//!
//! Responsibilities:
//! - Overlay one JSON value onto another, key by key.
//! - Merge whole configuration mappings for layered resolution.
//!
//! Does NOT handle:
//! - Deciding which layers exist or their order (see `manager`).
//! - Parsing override paths (see `overrides`).
//!
//! Invariants:
//! - Objects on both sides merge recursively; keys from both sides survive.
//! - In every other case the overlay wins outright (arrays are replaced, a
//!   scalar may replace an object and vice versa, null overrides).
//! - Both functions are pure: inputs are consumed, nothing is shared.

use serde_json::Value;

use crate::ConfigMap;

/// Deep merge two JSON values, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_owned(base_map, overlay_map))
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` on top of `base`, returning the combined mapping.
pub fn merge_maps(base: ConfigMap, overlay: &ConfigMap) -> ConfigMap {
    merge_owned(base, overlay.clone())
}

/// Fold layers in order; the last layer has the highest precedence.
pub fn merge_layers<I>(layers: I) -> ConfigMap
where
    I: IntoIterator<Item = ConfigMap>,
{
    layers.into_iter().fold(ConfigMap::new(), merge_owned)
}

fn merge_owned(mut base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}
