//! Live settings files: read, merge-patch and write back.
//!
//! Every update re-reads the file under an exclusive lock so edits made by
//! the owning tool since `open()` are patched rather than overwritten.
//! Lock files live in the cache directory, not next to the settings file.
//! The in-memory copy is replaced only after the new file is in place.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::patch::{merge_patch, merged, PatchError};

/// Errors that can occur when reading or updating a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings file '{path}' does not contain a JSON object")]
    NotObject { path: PathBuf },

    #[error("Failed to write settings file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock settings file '{path}': {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Result of applying a patch to a live settings file.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// Whether the file content changed (and was rewritten).
    pub changed: bool,
    /// The document after the patch.
    pub document: Value,
}

/// A JSON settings file plus a shared in-memory copy of its document.
///
/// Clones share the same document; updates are serialized by a write lock
/// in-process and an advisory file lock across processes.
#[derive(Clone)]
pub struct LiveSettings {
    inner: Arc<RwLock<Value>>,
    path: PathBuf,
    backup: bool,
    lock_dir: Option<PathBuf>,
}

impl LiveSettings {
    /// Load the settings file at `path`.
    ///
    /// A missing or blank file is an empty object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let document = read_document(&path)?;
        tracing::debug!(path = %path.display(), "settings file opened");
        Ok(Self {
            inner: Arc::new(RwLock::new(document)),
            path,
            backup: false,
            lock_dir: default_lock_dir(),
        })
    }

    /// Copy the current file to `<file>.bak` before each rewrite.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Directory holding the cross-process lock files.
    ///
    /// Defaults to `<cache dir>/ccpatch/locks`. When the directory cannot be
    /// created the lock falls back to `<file>.lock`.
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a clone of the current document.
    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    /// Re-read the file.
    ///
    /// On failure, keeps the old document and returns the error.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let document = read_document(&self.path)?;
        *self.inner.write() = document;
        Ok(())
    }

    /// Result of applying `patch` to the current document, without writing.
    pub fn preview(&self, patch: &Value) -> Result<Value, SettingsError> {
        Ok(merged(&self.inner.read(), patch)?)
    }

    /// Apply `patch` to the file on disk and persist the result.
    ///
    /// A symlinked path is written through to the file it points at. The
    /// file is not rewritten when the patch changes nothing.
    pub fn apply(&self, patch: &Value) -> Result<PatchOutcome, SettingsError> {
        let mut guard = self.inner.write();
        let target = resolve_target(&self.path);
        create_parent(&target)?;
        let _lock = lock_file(&target, self.lock_dir.as_deref())?;

        let current = read_document(&target)?;
        let mut next = current.clone();
        merge_patch(&mut next, patch)?;

        let changed = next != current;
        if changed {
            if self.backup && target.exists() {
                let backup_path = sibling(&target, "bak");
                fs::copy(&target, &backup_path).map_err(|source| SettingsError::Write {
                    path: backup_path.clone(),
                    source,
                })?;
            }
            write_document(&target, &next)?;
            tracing::info!(path = %target.display(), "settings file updated");
        } else {
            tracing::debug!(path = %target.display(), "patch made no changes");
        }

        *guard = next.clone();
        Ok(PatchOutcome {
            changed,
            document: next,
        })
    }
}

fn default_lock_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("ccpatch").join("locks"))
}

/// Follow symlinks so the rename replaces the real file, not the link.
/// A path that does not exist yet is used as given.
fn resolve_target(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn read_document(path: &Path) -> Result<Value, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Value::Object(Map::new())),
        Err(e) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let document: Value = serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if !document.is_object() {
        return Err(SettingsError::NotObject {
            path: path.to_path_buf(),
        });
    }
    Ok(document)
}

/// Take an exclusive advisory lock for `target`, released on drop.
fn lock_file(target: &Path, lock_dir: Option<&Path>) -> Result<File, SettingsError> {
    let lock_path = match lock_dir.filter(|dir| fs::create_dir_all(dir).is_ok()) {
        Some(dir) => dir.join(lock_name(target)),
        None => sibling(target, "lock"),
    };
    let lock_err = |source| SettingsError::Lock {
        path: lock_path.clone(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(lock_err)?;
    FileExt::lock_exclusive(&file).map_err(lock_err)?;
    Ok(file)
}

/// `settings.json-<fnv1a of the full path>.lock`, unique per target file.
fn lock_name(target: &Path) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in target.to_string_lossy().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".to_string());
    format!("{}-{:016x}.lock", file_name, hash)
}

/// Write via a temp file in the same directory, then rename over `path`.
///
/// The temp file takes the permissions of the file it replaces; new files
/// are owner-only on unix since settings often hold API tokens.
fn write_document(path: &Path, document: &Value) -> Result<(), SettingsError> {
    let mut content = serde_json::to_string_pretty(document).map_err(|e| SettingsError::Write {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    content.push('\n');

    let tmp_path = sibling(path, "tmp");
    let result = write_private(&tmp_path, content.as_bytes())
        .and_then(|()| copy_permissions(path, &tmp_path))
        .and_then(|()| fs::rename(&tmp_path, path));

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        SettingsError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::metadata(from) {
        Ok(metadata) => fs::set_permissions(to, metadata.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn create_parent(path: &Path) -> Result<(), SettingsError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// `settings.json` + `bak` -> `settings.json.bak`.
fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
