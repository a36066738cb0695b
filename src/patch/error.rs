//! Error types for merge patch application.

use thiserror::Error;

/// Errors that can occur when parsing or applying a merge patch.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patch root is not a JSON object.
    #[error("Invalid patch: expected a JSON object at the root, found {found}")]
    InvalidPatch { found: &'static str },

    /// The patch text is not valid JSON.
    #[error("Failed to parse patch: {0}")]
    Json(#[from] serde_json::Error),
}

/// Human-readable name of a JSON value's type, used in error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
