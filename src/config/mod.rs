//! Application configuration: which settings files can be patched.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{expand_home, AppTarget, Config, Defaults};
