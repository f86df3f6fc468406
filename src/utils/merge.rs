use serde_json::Value;

/// Recursively merge `overlay` over `base`, returning a new tree.
///
/// For every key present in `overlay`: if both sides hold a JSON object the
/// values are merged recursively, otherwise the overlay value replaces the
/// base value wholesale. Keys present only in `base` carry through unchanged.
/// Neither input is mutated, so a shared default tree can be merged against
/// concurrently without synchronization.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let value = match base_map.get(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        merge(base_value, overlay_value)
                    }
                    _ => overlay_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        // Non-object collisions replace, never merge.
        _ => overlay.clone(),
    }
}
