use serde_json::{json, Value};

use crate::patch::merged;

/// Unique identifier for each toggle.
///
/// Adding a new toggle: add a variant here + entry in `toggle_registry()`.
/// The `as_str()` value is the command-line key, do not rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleId {
    HideAttribution,
    AgentTeams,
}

impl ToggleId {
    /// Stable key used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HideAttribution => "hide_attribution",
            Self::AgentTeams => "agent_teams",
        }
    }

    /// All variants for iteration.
    pub fn all() -> &'static [ToggleId] {
        &[Self::HideAttribution, Self::AgentTeams]
    }

    /// Parse from key. Dashes are accepted in place of underscores.
    pub fn parse(s: &str) -> Option<Self> {
        match s.replace('-', "_").as_str() {
            "hide_attribution" => Some(Self::HideAttribution),
            "agent_teams" => Some(Self::AgentTeams),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToggleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-contained definition of a single toggle.
///
/// Both directions are merge patches, so switching a toggle never touches
/// keys it does not own.
pub struct ToggleDef {
    pub id: ToggleId,
    pub label: &'static str,
    pub description: &'static str,
    /// Patch applied when the toggle is switched on.
    pub on_patch: Value,
    /// Patch applied when the toggle is switched off.
    pub off_patch: Value,
}

/// Current state of one toggle in a settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleState {
    pub id: ToggleId,
    pub label: &'static str,
    pub enabled: bool,
}

/// Ordered toggle definitions.
pub fn toggle_registry() -> Vec<ToggleDef> {
    vec![
        ToggleDef {
            id: ToggleId::HideAttribution,
            label: "Hide Attribution",
            description: "Blank the co-author trailer on commits and pull requests",
            on_patch: json!({"attribution": {"commit": "", "pr": ""}}),
            off_patch: json!({"attribution": null}),
        },
        ToggleDef {
            id: ToggleId::AgentTeams,
            label: "Agent Teams",
            description: "Enable multi-agent collaboration (experimental)",
            on_patch: json!({"env": {"CLAUDE_CODE_EXPERIMENTAL_AGENT_TEAMS": "1"}}),
            off_patch: json!({"env": {"CLAUDE_CODE_EXPERIMENTAL_AGENT_TEAMS": null}}),
        },
    ]
}

fn definition(id: ToggleId) -> Option<ToggleDef> {
    toggle_registry().into_iter().find(|def| def.id == id)
}

/// The patch that switches `id` on or off.
pub fn patch_for(id: ToggleId, enabled: bool) -> Value {
    match definition(id) {
        Some(def) if enabled => def.on_patch,
        Some(def) => def.off_patch,
        None => json!({}),
    }
}

/// A toggle is on when applying its on-patch would not change the document.
pub fn is_enabled(id: ToggleId, document: &Value) -> bool {
    match definition(id) {
        Some(def) => merged(document, &def.on_patch).is_ok_and(|result| &result == document),
        None => false,
    }
}

/// State of every registered toggle, in registry order.
pub fn toggle_states(document: &Value) -> Vec<ToggleState> {
    toggle_registry()
        .iter()
        .map(|def| ToggleState {
            id: def.id,
            label: def.label,
            enabled: is_enabled(def.id, document),
        })
        .collect()
}
