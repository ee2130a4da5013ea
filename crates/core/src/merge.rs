//! Deep merge of user overrides into generated property trees.

use serde_json::Value;

/// Recursively merge `overrides` into `generated`.
///
/// Mappings merge key-by-key, the override winning on leaf conflicts;
/// scalars and arrays replace wholesale, never concatenate. Keys present
/// only in `generated` are kept, so overriding one property never drops
/// its siblings. The merge is total: every pair of trees produces a
/// result.
pub fn deep_merge(generated: &mut Value, overrides: &Value) {
    match (generated, overrides) {
        (Value::Object(base), Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
