//! # Namespace Unit
//!
//! A single namespace's SQLite database. All statements on a unit go through
//! one connection behind a mutex, so writers to the same namespace are
//! serialized while different namespaces never contend.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::backup::Backup;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};

use super::errors::{StoreError, StoreResult};
use super::schema::DATA_SCHEMA_V1;
use super::types::{KeyEntry, Namespace, Page, Pagination, Record};

/// How long a statement waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One namespace's backing database
#[derive(Debug)]
pub struct NamespaceUnit {
    name: String,
    path: PathBuf,
    stream: bool,
    conn: Mutex<Connection>,
}

impl NamespaceUnit {
    /// Open (or create) the unit at `path` and apply the schema
    pub fn open(name: &str, path: &Path, stream: bool) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            tracing::debug!(namespace = name, journal_mode = %mode, "WAL journal unavailable");
        }
        conn.execute_batch(DATA_SCHEMA_V1)?;

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            stream,
            conn: Mutex::new(conn),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Descriptor for listings and status
    pub fn descriptor(&self) -> Namespace {
        Namespace {
            name: self.name.clone(),
            path: self.path.clone(),
            stream: self.stream,
        }
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert a new record; fails if `key` is already present
    pub fn insert(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO data (data_id, data) VALUES (?1, ?2)",
            params![key, data],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::KeyExists {
                    namespace: self.name.clone(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace the payload of `key`
    ///
    /// `created_at` keeps the value from the first insert.
    pub fn upsert(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO data (data_id, data) VALUES (?1, ?2) \
             ON CONFLICT(data_id) DO UPDATE SET data = excluded.data",
            params![key, data],
        )?;
        Ok(())
    }

    /// Fetch one record
    pub fn get(&self, key: &str) -> StoreResult<Record> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT data_id, data, created_at FROM data WHERE data_id = ?1",
            params![key],
            |row| {
                Ok(Record {
                    key: row.get(0)?,
                    data: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::KeyNotFound {
            namespace: self.name.clone(),
            key: key.to_string(),
        })
    }

    /// Remove `key`; absent keys are not an error
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM data WHERE data_id = ?1", params![key])?;
        Ok(())
    }

    /// Number of records
    pub fn count(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        Self::count_with(&conn)
    }

    fn count_with(conn: &Connection) -> StoreResult<u64> {
        let total: i64 = conn.query_row("SELECT count(*) FROM data", [], |row| row.get(0))?;
        Ok(total as u64)
    }

    /// Full records, oldest first
    pub fn list(&self, pagination: Pagination) -> StoreResult<Page<Record>> {
        let conn = self.conn()?;
        let total = Self::count_with(&conn)?;

        let mut stmt = conn.prepare_cached(
            "SELECT data_id, data, created_at FROM data \
             ORDER BY created_at ASC, rowid ASC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![pagination.limit(), pagination.offset()], |row| {
                Ok(Record {
                    key: row.get(0)?,
                    data: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            rows,
            total,
            next: pagination.next_page(total),
        })
    }

    /// Keys only, newest first
    pub fn list_keys(&self, pagination: Pagination) -> StoreResult<Page<KeyEntry>> {
        let conn = self.conn()?;
        let total = Self::count_with(&conn)?;

        let mut stmt = conn.prepare_cached(
            "SELECT data_id, created_at FROM data \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![pagination.limit(), pagination.offset()], |row| {
                Ok(KeyEntry {
                    key: row.get(0)?,
                    created_at: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            rows,
            total,
            next: pagination.next_page(total),
        })
    }

    /// Point-in-time copy of the unit into `dest`
    ///
    /// Reads through a dedicated read-only connection, so the unit's own
    /// connection stays available to writers while the copy runs. The whole
    /// database is copied in one backup step.
    pub fn backup_to(&self, dest: &Path) -> StoreResult<()> {
        let src = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        src.busy_timeout(BUSY_TIMEOUT)?;

        let mut dst = Connection::open(dest)?;
        let backup = Backup::new(&src, &mut dst)?;
        backup.run_to_completion(-1, Duration::ZERO, None)?;
        Ok(())
    }
}
