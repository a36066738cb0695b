//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary settings file with the given content.
pub fn temp_settings(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, content).expect("Failed to write settings file");
    (temp_dir, path)
}

/// Create a temporary config file pointing app `test` at `settings_path`.
pub fn temp_config(dir: &TempDir, settings_path: &std::path::Path, backup: bool) -> PathBuf {
    let config_path = dir.path().join("config.toml");
    let content = format!(
        r#"[defaults]
app = "test"
backup = {backup}

[[apps]]
name = "test"
display_name = "Test"
settings_path = "{}"
"#,
        settings_path.display().to_string().replace('\\', "\\\\")
    );
    std::fs::write(&config_path, content).expect("Failed to write config file");
    config_path
}

/// Read and parse a JSON file.
pub fn read_json(path: &std::path::Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("Failed to read JSON file");
    serde_json::from_str(&content).expect("Invalid JSON")
}
