//! # Storage Service
//!
//! Orchestrates one request against the namespace store.
//!
//! Write path: compress, persist on the blocking pool, then hand a change
//! event to the notifier without waiting for it. Persistence has completed
//! before the event is spawned, and a notifier failure never reaches the
//! caller.
//!
//! Read path: fetch, then decompress. A payload that does not decompress is
//! reported as `Internal`, never as `NotFound`.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::namespace::{KeyEntry, Namespace, NamespaceStore, Page, Pagination, Record, StoreError};
use crate::notifier::{ChangeEvent, ChangeKind, ChangeNotifier};
use crate::observability::{Event, MetricsRegistry, MetricsSnapshot};

use super::compression::{compress, decompress, DEFAULT_LEVEL};
use super::errors::{ServiceError, ServiceResult};

/// Storage service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding one file per namespace
    pub ns_dir: PathBuf,
    /// Whether namespaces emit change events unless told otherwise
    pub stream: bool,
    /// zstd level for stored payloads
    pub compression_level: i32,
}

impl ServiceConfig {
    pub fn new(ns_dir: impl Into<PathBuf>) -> Self {
        Self {
            ns_dir: ns_dir.into(),
            stream: false,
            compression_level: DEFAULT_LEVEL,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Volume status report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Default stream setting for new namespaces
    pub stream: bool,
    /// Approximate stream cap, absent without a broker
    pub stream_limit: Option<u64>,
    /// Stream name prefix, absent without a broker
    pub stream_prefix: Option<String>,
    pub namespaces: Vec<String>,
    pub metrics: MetricsSnapshot,
}

/// Which write operation to run
#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Insert,
    Upsert,
}

impl WriteMode {
    fn kind(self) -> ChangeKind {
        match self {
            WriteMode::Insert => ChangeKind::Insert,
            WriteMode::Upsert => ChangeKind::Upsert,
        }
    }
}

/// Request orchestration for the volume role
#[derive(Debug, Clone)]
pub struct StorageService {
    store: Arc<NamespaceStore>,
    notifier: Option<ChangeNotifier>,
    compression_level: i32,
    metrics: Arc<MetricsRegistry>,
}

impl StorageService {
    pub fn new(
        store: Arc<NamespaceStore>,
        notifier: Option<ChangeNotifier>,
        compression_level: i32,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            store,
            notifier,
            compression_level,
            metrics,
        }
    }

    /// Open the store and register every namespace already on disk
    ///
    /// A directory that cannot be scanned is logged; the service still
    /// starts with the namespaces it has.
    pub fn open(
        config: &ServiceConfig,
        notifier: Option<ChangeNotifier>,
        metrics: Arc<MetricsRegistry>,
    ) -> ServiceResult<Self> {
        let store = NamespaceStore::open(&config.ns_dir, config.stream)?;
        if let Err(e) = store.load() {
            tracing::error!(
                event = %Event::NamespaceScanFailed,
                path = %config.ns_dir.display(),
                error = %e,
            );
        }

        Ok(Self::new(
            Arc::new(store),
            notifier,
            config.compression_level,
            metrics,
        ))
    }

    pub fn store(&self) -> &Arc<NamespaceStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    // ==================
    // Write path
    // ==================

    /// Insert or replace `key`
    pub async fn upsert(&self, namespace: &str, key: &str, data: &[u8]) -> ServiceResult<()> {
        self.write(WriteMode::Upsert, namespace, key, data).await
    }

    /// Insert `key`; `Conflict` if it exists, leaving the stored value as is
    pub async fn insert(&self, namespace: &str, key: &str, data: &[u8]) -> ServiceResult<()> {
        self.write(WriteMode::Insert, namespace, key, data).await
    }

    async fn write(&self, mode: WriteMode, namespace: &str, key: &str, data: &[u8]) -> ServiceResult<()> {
        let compressed = compress(data, self.compression_level)?;

        let store = self.store.clone();
        let ns = namespace.to_string();
        let k = key.to_string();
        let persisted = tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
            match mode {
                WriteMode::Insert => store.insert(&ns, &k, &compressed)?,
                WriteMode::Upsert => store.upsert(&ns, &k, &compressed)?,
            }
            Ok(store.namespace(&ns)?.stream)
        })
        .await?;

        let stream = match persisted {
            Ok(stream) => stream,
            Err(e) => {
                if matches!(e, StoreError::KeyExists { .. }) {
                    self.metrics.increment_write_conflicts();
                }
                tracing::debug!(event = %Event::WriteRejected, namespace, key, error = %e);
                return Err(e.into());
            }
        };

        self.metrics.increment_writes();
        tracing::debug!(event = %Event::WriteCommit, namespace, key, bytes = data.len());

        if stream {
            if let Some(notifier) = &self.notifier {
                // Detached; the response does not wait on the broker.
                drop(notifier.notify(ChangeEvent::new(namespace, key, mode.kind())));
            }
        }
        Ok(())
    }

    /// Remove `key`; absent keys succeed too
    pub async fn delete(&self, namespace: &str, key: &str) -> ServiceResult<()> {
        let store = self.store.clone();
        let ns = namespace.to_string();
        let k = key.to_string();
        tokio::task::spawn_blocking(move || store.delete(&ns, &k)).await??;

        self.metrics.increment_deletes();
        Ok(())
    }

    // ==================
    // Read path
    // ==================

    /// Decompressed payload of `key`
    pub async fn get(&self, namespace: &str, key: &str) -> ServiceResult<Vec<u8>> {
        let store = self.store.clone();
        let ns = namespace.to_string();
        let k = key.to_string();
        let fetched = tokio::task::spawn_blocking(move || store.get(&ns, &k)).await?;

        let record = match fetched {
            Ok(record) => record,
            Err(e) => {
                if e.is_not_found() {
                    self.metrics.increment_reads_not_found();
                }
                return Err(e.into());
            }
        };

        let data = self.open_payload(namespace, &record)?;
        self.metrics.increment_reads();
        Ok(data)
    }

    /// One page of records, oldest first, payloads decompressed
    pub async fn list(&self, namespace: &str, pagination: Pagination) -> ServiceResult<Page<Record>> {
        let store = self.store.clone();
        let ns = namespace.to_string();
        let page = tokio::task::spawn_blocking(move || store.list(&ns, pagination)).await??;

        page.try_map(|record| {
            let data = self.open_payload(namespace, &record)?;
            Ok(Record { data, ..record })
        })
    }

    /// One page of keys, newest first
    pub async fn list_keys(&self, namespace: &str, pagination: Pagination) -> ServiceResult<Page<KeyEntry>> {
        let store = self.store.clone();
        let ns = namespace.to_string();
        let page = tokio::task::spawn_blocking(move || store.list_keys(&ns, pagination)).await??;
        Ok(page)
    }

    fn open_payload(&self, namespace: &str, record: &Record) -> ServiceResult<Vec<u8>> {
        decompress(&record.data).map_err(|e| {
            self.metrics.increment_corrupted_reads();
            tracing::error!(
                event = %Event::PayloadCorrupted,
                namespace,
                key = %record.key,
                stored_bytes = record.data.len(),
            );
            e
        })
    }

    // ==================
    // Namespaces
    // ==================

    /// Create `name` if needed; returns whether it was created and the
    /// resulting namespace list
    pub async fn create_namespace(&self, name: &str, stream: Option<bool>) -> ServiceResult<(bool, Vec<String>)> {
        let store = self.store.clone();
        let ns = name.to_string();
        let created = tokio::task::spawn_blocking(move || store.create(&ns, stream)).await??;

        if created {
            self.metrics.increment_namespaces_created();
        }
        Ok((created, self.store.names()))
    }

    /// Registered namespace names, `default` first
    pub fn namespaces(&self) -> Vec<String> {
        self.store.names()
    }

    pub fn namespace(&self, name: &str) -> ServiceResult<Namespace> {
        Ok(self.store.namespace(name)?)
    }

    /// Hot backup of `namespace`; returns the backup file path
    pub async fn backup(&self, namespace: &str) -> ServiceResult<PathBuf> {
        let store = self.store.clone();
        let ns = namespace.to_string();
        let path = tokio::task::spawn_blocking(move || store.backup(&ns)).await??;

        self.metrics.increment_backups();
        Ok(path)
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            stream: self.store.default_stream(),
            stream_limit: self.notifier.as_ref().map(|n| n.max_len()),
            stream_prefix: self.notifier.as_ref().map(|n| n.prefix().to_string()),
            namespaces: self.store.names(),
            metrics: self.metrics.snapshot(),
        }
    }
}
