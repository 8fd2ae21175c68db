//! Partial-document merge.
//!
//! A push may carry the full document or only the members that changed. Objects
//! merge recursively member by member, any other value replaces what was there,
//! and `null` members leave the existing value untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::DecodeError;

/// Merge `patch` into `base` in place.
pub fn merge_value(base: &mut Value, patch: Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None if value.is_null() => {}
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Produce the value of `current` after applying `document` to it.
///
/// Fails when the merged document no longer fits `T`; `current` is left as it was.
pub fn merge_document<T>(current: &T, document: Value) -> Result<T, DecodeError>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(current).map_err(DecodeError::Document)?;
    merge_value(&mut merged, document);
    serde_json::from_value(merged).map_err(DecodeError::Document)
}
