mod common;

use ccpatch::settings::{LiveSettings, SettingsError};
use common::{read_json, temp_settings};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn missing_file_opens_as_empty_object() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("settings.json");

    let settings = LiveSettings::open(&path).unwrap();
    assert_eq!(settings.snapshot(), json!({}));

    let outcome = settings.apply(&json!({"model": "opus"})).unwrap();
    assert!(outcome.changed);
    assert_eq!(read_json(&path), json!({"model": "opus"}));
}

#[test]
fn blank_file_opens_as_empty_object() {
    let (_dir, path) = temp_settings("  \n");
    let settings = LiveSettings::open(&path).unwrap();
    assert_eq!(settings.snapshot(), json!({}));
}

#[test]
fn non_object_file_is_rejected() {
    let (_dir, path) = temp_settings("[1, 2]");
    let err = LiveSettings::open(&path).err().expect("should fail");
    assert!(matches!(err, SettingsError::NotObject { .. }));
}

#[test]
fn invalid_json_reports_path() {
    let (_dir, path) = temp_settings("{ not json");
    let err = LiveSettings::open(&path).err().expect("should fail");
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("settings.json"));
}

#[test]
fn apply_persists_and_updates_snapshot() {
    let (_dir, path) = temp_settings(r#"{"env": {"A": "1", "B": "2"}, "model": "sonnet"}"#);
    let settings = LiveSettings::open(&path).unwrap();

    let outcome = settings
        .apply(&json!({"env": {"A": null}, "model": "opus"}))
        .unwrap();

    let expected = json!({"env": {"B": "2"}, "model": "opus"});
    assert!(outcome.changed);
    assert_eq!(outcome.document, expected);
    assert_eq!(settings.snapshot(), expected);
    assert_eq!(read_json(&path), expected);
}

#[test]
fn unchanged_document_is_not_rewritten() {
    let original = "{\"model\":\"opus\"}";
    let (_dir, path) = temp_settings(original);
    let settings = LiveSettings::open(&path).unwrap().with_backup(true);

    let outcome = settings.apply(&json!({"model": "opus"})).unwrap();

    assert!(!outcome.changed);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    assert!(!path.with_extension("json.bak").exists());
}

#[test]
fn backup_keeps_previous_content() {
    let original = r#"{"model": "sonnet"}"#;
    let (_dir, path) = temp_settings(original);
    let settings = LiveSettings::open(&path).unwrap().with_backup(true);

    settings.apply(&json!({"model": "opus"})).unwrap();

    let backup = path.with_extension("json.bak");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), original);
    assert_eq!(read_json(&path), json!({"model": "opus"}));
}

#[test]
fn apply_patches_external_edits_made_after_open() {
    let (_dir, path) = temp_settings(r#"{"a": 1}"#);
    let settings = LiveSettings::open(&path).unwrap();

    std::fs::write(&path, r#"{"a": 1, "external": true}"#).unwrap();
    settings.apply(&json!({"b": 2})).unwrap();

    assert_eq!(read_json(&path), json!({"a": 1, "external": true, "b": 2}));
}

#[test]
fn preview_does_not_write() {
    let (_dir, path) = temp_settings(r#"{"a": 1}"#);
    let settings = LiveSettings::open(&path).unwrap();

    let preview = settings.preview(&json!({"a": null, "b": [1]})).unwrap();

    assert_eq!(preview, json!({"b": [1]}));
    assert_eq!(settings.snapshot(), json!({"a": 1}));
    assert_eq!(read_json(&path), json!({"a": 1}));
}

#[test]
fn non_object_patch_leaves_file_untouched() {
    let (_dir, path) = temp_settings(r#"{"a": 1}"#);
    let settings = LiveSettings::open(&path).unwrap();

    let err = settings.apply(&json!("replace")).unwrap_err();

    assert!(matches!(err, SettingsError::Patch(_)));
    assert_eq!(read_json(&path), json!({"a": 1}));
}

#[test]
fn clones_share_the_document() {
    let (_dir, path) = temp_settings("{}");
    let settings = LiveSettings::open(&path).unwrap();
    let other = settings.clone();

    settings.apply(&json!({"x": 1})).unwrap();
    assert_eq!(other.snapshot(), json!({"x": 1}));
}

#[test]
fn concurrent_applies_are_all_persisted() {
    let (_dir, path) = temp_settings("{}");
    let settings = LiveSettings::open(&path).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let settings = settings.clone();
            std::thread::spawn(move || {
                let mut patch = serde_json::Map::new();
                patch.insert(format!("key{}", i), json!(i));
                settings.apply(&serde_json::Value::Object(patch)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let document = read_json(&path);
    assert_eq!(document.as_object().unwrap().len(), 8);
}

#[test]
fn reload_picks_up_disk_changes() {
    let (_dir, path) = temp_settings(r#"{"a": 1}"#);
    let settings = LiveSettings::open(&path).unwrap();

    std::fs::write(&path, r#"{"a": 2}"#).unwrap();
    settings.reload().unwrap();
    assert_eq!(settings.snapshot(), json!({"a": 2}));
}

#[test]
fn lock_file_is_kept_out_of_the_settings_directory() {
    let (dir, path) = temp_settings("{}");
    let locks = TempDir::new().unwrap();
    let settings = LiveSettings::open(&path).unwrap().with_lock_dir(locks.path());

    settings.apply(&json!({"a": 1})).unwrap();

    assert!(!path.with_extension("json.lock").exists());
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("settings.json")]);
    assert_eq!(std::fs::read_dir(locks.path()).unwrap().count(), 1);
}

#[cfg(unix)]
#[test]
fn symlinked_settings_file_is_written_through() {
    let temp_dir = TempDir::new().unwrap();
    let real = temp_dir.path().join("dotfiles-settings.json");
    let link = temp_dir.path().join("settings.json");
    std::fs::write(&real, r#"{"a": 1}"#).unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let settings = LiveSettings::open(&link).unwrap();
    settings.apply(&json!({"b": 2})).unwrap();

    let link_meta = std::fs::symlink_metadata(&link).unwrap();
    assert!(link_meta.file_type().is_symlink());
    assert_eq!(read_json(&real), json!({"a": 1, "b": 2}));
    assert_eq!(read_json(&link), json!({"a": 1, "b": 2}));
}

#[cfg(unix)]
#[test]
fn apply_keeps_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = temp_settings(r#"{"env": {"ANTHROPIC_AUTH_TOKEN": "sk-secret"}}"#);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();

    let settings = LiveSettings::open(&path).unwrap();
    settings.apply(&json!({"model": "opus"})).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[cfg(unix)]
#[test]
fn new_settings_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    LiveSettings::open(&path)
        .unwrap()
        .apply(&json!({"env": {"ANTHROPIC_AUTH_TOKEN": "sk-secret"}}))
        .unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}
