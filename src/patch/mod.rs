//! JSON Merge Patch (RFC 7396) over `serde_json` values.

mod error;
mod merge;

pub use error::PatchError;
pub use merge::{apply_document, json_merge_patch, merge_patch, merged, parse_patch};
