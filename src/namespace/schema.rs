//! # Namespace File Layout
//!
//! One SQLite database per namespace:
//!
//! - `<root>/<name>.db`: live data (plus SQLite `-wal`/`-shm` siblings)
//! - `<root>/<name>.backup.db`: latest hot backup
//!
//! Namespace names are restricted to `[A-Za-z0-9_-]`, so a name never
//! contains `.` and stripping the `.db` suffix recovers it unambiguously.

use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};

/// Schema applied to every namespace unit.
pub const DATA_SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS data (
    data_id    TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS created_ix ON data(created_at);
";

/// Namespace that always exists
pub const DEFAULT_NAMESPACE: &str = "default";

/// Suffix of a live namespace file
pub const UNIT_SUFFIX: &str = ".db";

/// Marker inserted before [`UNIT_SUFFIX`] for backup files
pub const BACKUP_MARKER: &str = ".backup";

/// Longest accepted namespace name
pub const MAX_NAME_LEN: usize = 128;

/// Names that collide with fixed HTTP routes
const RESERVED_NAMES: &[&str] = &["status", "v1"];

/// Check that `name` is usable as both a route segment and a file stem
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StoreError::InvalidName(format!(
            "'{}': length must be between 1 and {}",
            name, MAX_NAME_LEN
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidName(format!(
            "'{}': only ASCII letters, digits, '_' and '-' are allowed",
            name
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(StoreError::InvalidName(format!("'{}' is reserved", name)));
    }
    Ok(())
}

/// Path of the live unit for `name`
pub fn unit_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}{}", name, UNIT_SUFFIX))
}

/// Path of the backup unit for `name`
pub fn backup_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}{}{}", name, BACKUP_MARKER, UNIT_SUFFIX))
}

/// Namespace name for a directory entry, if the entry is a live unit
///
/// Backups, SQLite sidecar files and anything with an invalid stem yield
/// `None`.
pub fn namespace_from_file_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(UNIT_SUFFIX)?;
    if stem.ends_with(BACKUP_MARKER) {
        return None;
    }
    validate_name(stem).ok()?;
    Some(stem)
}
