//! Provider settings documents: toggles and live files.

mod live;
mod toggles;

pub use live::{LiveSettings, PatchOutcome, SettingsError};
pub use toggles::{
    is_enabled, patch_for, toggle_registry, toggle_states, ToggleDef, ToggleId, ToggleState,
};
