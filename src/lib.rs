//! Author and switch AI CLI provider settings with JSON Merge Patches.
//!
//! - [`patch`]: RFC 7396 merge patch over `serde_json` values
//! - [`settings`]: named toggles and live settings files
//! - [`config`]: which settings files can be patched

pub mod cli;
pub mod config;
pub mod logging;
pub mod patch;
pub mod settings;
