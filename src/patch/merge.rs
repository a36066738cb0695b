//! RFC 7396 JSON Merge Patch.
//!
//! `null` in a patch deletes, a nested object merges recursively, and any
//! other value (arrays included) replaces the target value wholesale.
//! Nested objects left empty by a merge are pruned from their parent.

use serde_json::{Map, Value};

use super::error::{json_type_name, PatchError};

/// Apply `patch` to `target` in place and return `target` for chaining.
///
/// A target value that is missing or not an object is replaced by an empty
/// object before a nested object patch is merged into it. If the merge
/// leaves that nested object empty, its key is removed.
pub fn json_merge_patch<'a>(
    target: &'a mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> &'a mut Map<String, Value> {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.shift_remove(key);
            }
            Value::Object(nested) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                merge_into_value(slot, nested);

                let now_empty = slot.as_object().is_some_and(Map::is_empty);
                if now_empty {
                    target.shift_remove(key);
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
    target
}

/// Apply an object patch to a JSON document.
///
/// A non-object `target` is treated as an empty object. A non-object
/// `patch` is rejected and `target` is left untouched.
pub fn merge_patch(target: &mut Value, patch: &Value) -> Result<(), PatchError> {
    let Value::Object(patch) = patch else {
        return Err(PatchError::InvalidPatch {
            found: json_type_name(patch),
        });
    };
    merge_into_value(target, patch);
    Ok(())
}

/// Apply a patch with full RFC 7396 root semantics.
///
/// Unlike [`merge_patch`], a non-object patch replaces the whole document.
pub fn apply_document(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(patch) => merge_into_value(target, patch),
        other => *target = other.clone(),
    }
}

/// Return a patched copy of `target`, leaving it untouched.
pub fn merged(target: &Value, patch: &Value) -> Result<Value, PatchError> {
    let mut result = target.clone();
    merge_patch(&mut result, patch)?;
    Ok(result)
}

/// Parse patch text, requiring an object at the root.
pub fn parse_patch(text: &str) -> Result<Map<String, Value>, PatchError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(PatchError::InvalidPatch {
            found: json_type_name(&other),
        }),
    }
}

fn merge_into_value(slot: &mut Value, patch: &Map<String, Value>) {
    match slot {
        Value::Object(map) => {
            json_merge_patch(map, patch);
        }
        other => {
            let mut map = Map::new();
            json_merge_patch(&mut map, patch);
            *other = Value::Object(map);
        }
    }
}
