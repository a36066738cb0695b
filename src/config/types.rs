use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default = "default_apps")]
    pub apps: Vec<AppTarget>,
}

/// Default settings for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Name of the app patched when no target is given on the command line.
    #[serde(default = "default_app")]
    pub app: String,
    /// Copy the settings file to `<file>.bak` before replacing it (default: true).
    #[serde(default = "default_backup")]
    pub backup: bool,
}

/// A CLI tool whose JSON settings file can be patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppTarget {
    /// Unique identifier (e.g., "claude", "gemini").
    pub name: String,
    /// Display name (e.g., "Claude Code").
    pub display_name: String,
    /// Settings file location. A leading `~` expands to the home directory.
    pub settings_path: String,
}

impl AppTarget {
    fn new(name: &str, display_name: &str, settings_path: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            settings_path: settings_path.to_string(),
        }
    }

    /// Settings path with a leading `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.settings_path)
    }
}

/// Expand a leading `~` or `~/` using `dirs::home_dir()`.
///
/// Paths without a leading tilde, and all paths when the home directory
/// is unknown, are returned as-is.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn default_app() -> String {
    "claude".to_string()
}

fn default_backup() -> bool {
    true
}

fn default_apps() -> Vec<AppTarget> {
    vec![
        AppTarget::new("claude", "Claude Code", "~/.claude/settings.json"),
        AppTarget::new("gemini", "Gemini CLI", "~/.gemini/settings.json"),
        AppTarget::new("opencode", "OpenCode", "~/.config/opencode/opencode.json"),
    ]
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            app: default_app(),
            backup: default_backup(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            apps: default_apps(),
        }
    }
}
