//! # Namespace Store
//!
//! Registry of namespace units under one root directory.
//!
//! The name → unit map is read by every request and written only when a
//! namespace is created, so it sits behind an `RwLock`: lookups share the
//! read side, creation takes the write side and re-checks before opening.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::observability::Event;

use super::errors::{StoreError, StoreResult};
use super::schema::{backup_path, namespace_from_file_name, unit_path, validate_name, DEFAULT_NAMESPACE};
use super::types::{KeyEntry, Namespace, Page, Pagination, Record};
use super::unit::NamespaceUnit;

#[derive(Debug, Default)]
struct Registry {
    units: HashMap<String, Arc<NamespaceUnit>>,
    /// Registration order, `default` first
    order: Vec<String>,
}

/// All namespaces of one storage node
#[derive(Debug)]
pub struct NamespaceStore {
    root: PathBuf,
    default_stream: bool,
    registry: RwLock<Registry>,
}

impl NamespaceStore {
    /// Open the store rooted at `root`
    ///
    /// Creates the directory when missing and the `default` namespace.
    /// Existing namespace files are not registered until [`load`](Self::load).
    pub fn open(root: impl Into<PathBuf>, default_stream: bool) -> StoreResult<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
            tracing::info!(event = %Event::NamespaceDirCreated, path = %root.display());
        }

        let store = Self {
            root,
            default_stream,
            registry: RwLock::new(Registry::default()),
        };
        store.create(DEFAULT_NAMESPACE, None)?;
        Ok(store)
    }

    /// Root directory holding the namespace files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stream setting applied to namespaces that do not choose one
    pub fn default_stream(&self) -> bool {
        self.default_stream
    }

    /// Create and register namespace `name`
    ///
    /// Returns `false` without side effects if it is already registered.
    /// `stream` falls back to the store-wide default.
    pub fn create(&self, name: &str, stream: Option<bool>) -> StoreResult<bool> {
        validate_name(name)?;

        if self.contains(name) {
            return Ok(false);
        }

        let mut registry = self.registry.write().map_err(|_| StoreError::LockPoisoned)?;
        if registry.units.contains_key(name) {
            return Ok(false);
        }

        let path = unit_path(&self.root, name);
        let unit = NamespaceUnit::open(name, &path, stream.unwrap_or(self.default_stream))?;
        registry.units.insert(name.to_string(), Arc::new(unit));
        registry.order.push(name.to_string());

        tracing::info!(event = %Event::NamespaceCreated, namespace = name, path = %path.display());
        Ok(true)
    }

    /// Register every namespace file found in the root directory
    ///
    /// Returns the names registered by this call. A file that fails to
    /// open is logged and skipped; only an unreadable directory is an error.
    pub fn load(&self) -> StoreResult<Vec<String>> {
        let mut candidates: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let file_name = file_name.to_str()?;
                namespace_from_file_name(file_name).map(str::to_string)
            })
            .filter(|name| name != DEFAULT_NAMESPACE)
            .collect();
        candidates.sort();

        let mut loaded = Vec::with_capacity(candidates.len());
        for name in candidates {
            match self.create(&name, None) {
                Ok(true) => {
                    tracing::info!(event = %Event::NamespaceLoaded, namespace = %name);
                    loaded.push(name);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(event = %Event::NamespaceLoadFailed, namespace = %name, error = %e);
                }
            }
        }
        Ok(loaded)
    }

    /// Registered namespace names, `default` first
    pub fn names(&self) -> Vec<String> {
        self.registry
            .read()
            .map(|r| r.order.clone())
            .unwrap_or_default()
    }

    /// Descriptors of every registered namespace
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.registry
            .read()
            .map(|r| {
                r.order
                    .iter()
                    .filter_map(|name| r.units.get(name))
                    .map(|unit| unit.descriptor())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.registry
            .read()
            .map(|r| r.units.contains_key(name))
            .unwrap_or(false)
    }

    /// Descriptor of one namespace
    pub fn namespace(&self, name: &str) -> StoreResult<Namespace> {
        Ok(self.unit(name)?.descriptor())
    }

    fn unit(&self, name: &str) -> StoreResult<Arc<NamespaceUnit>> {
        let registry = self.registry.read().map_err(|_| StoreError::LockPoisoned)?;
        registry
            .units
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NamespaceNotFound(name.to_string()))
    }

    /// Insert-only write
    pub fn insert(&self, namespace: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        self.unit(namespace)?.insert(key, data)
    }

    /// Insert-or-replace write
    pub fn upsert(&self, namespace: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        self.unit(namespace)?.upsert(key, data)
    }

    pub fn get(&self, namespace: &str, key: &str) -> StoreResult<Record> {
        self.unit(namespace)?.get(key)
    }

    /// Idempotent delete
    /// Remove `key`; an unknown namespace holds no keys, so it succeeds too
    pub fn delete(&self, namespace: &str, key: &str) -> StoreResult<()> {
        match self.unit(namespace) {
            Ok(unit) => unit.delete(key),
            Err(StoreError::NamespaceNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn list(&self, namespace: &str, pagination: Pagination) -> StoreResult<Page<Record>> {
        self.unit(namespace)?.list(pagination)
    }

    pub fn list_keys(&self, namespace: &str, pagination: Pagination) -> StoreResult<Page<KeyEntry>> {
        self.unit(namespace)?.list_keys(pagination)
    }

    /// Hot backup of `namespace` to `<root>/<name>.backup.db`
    pub fn backup(&self, namespace: &str) -> StoreResult<PathBuf> {
        let unit = self.unit(namespace)?;
        let dest = backup_path(&self.root, namespace);

        tracing::info!(event = %Event::BackupStart, namespace, dest = %dest.display());
        match unit.backup_to(&dest) {
            Ok(()) => {
                tracing::info!(event = %Event::BackupComplete, namespace, dest = %dest.display());
                Ok(dest)
            }
            Err(e) => {
                tracing::error!(event = %Event::BackupFailed, namespace, error = %e);
                Err(e)
            }
        }
    }
}
