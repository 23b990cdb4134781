//! Observability events for rawstore
//!
//! Every log line carries exactly one of these events in its `event` field,
//! so log consumers can filter on a closed vocabulary instead of free text.

use std::fmt;

/// Observable events in rawstore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Server bound and accepting requests
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Configuration
    /// Configuration resolved from flags and environment
    ConfigLoaded,
    /// Namespace directory created on first start
    NamespaceDirCreated,

    // Namespace lifecycle
    /// New namespace unit created
    NamespaceCreated,
    /// Existing namespace unit discovered during a directory scan
    NamespaceLoaded,
    /// A namespace file could not be opened during a scan
    NamespaceLoadFailed,
    /// The namespace directory could not be scanned
    NamespaceScanFailed,

    // Backup operations
    /// Backup started
    BackupStart,
    /// Backup complete
    BackupComplete,
    /// Backup failed
    BackupFailed,

    // Data path
    /// Write committed to a namespace
    WriteCommit,
    /// Write rejected (conflict, storage failure)
    WriteRejected,
    /// Stored payload failed to decompress
    PayloadCorrupted,
    /// Blocking storage task panicked or was cancelled
    StorageTaskFailed,

    // Change stream
    /// Connected to the stream broker
    StreamConnected,
    /// Change event appended to a stream
    EventPublished,
    /// Change event dropped after a failed publish
    EventPublishFailed,
    /// Consumer group created
    ConsumerGroupCreated,
    /// Consumer handler rejected an entry; left pending
    ConsumerEntryRejected,

    // HTTP
    /// Request rejected by the per-IP rate limiter
    RateLimited,
    /// Router role redirected a request to its owning node
    Redirected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "RAWSTORE_STARTUP_BEGIN",
            Event::Serving => "RAWSTORE_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::NamespaceDirCreated => "NAMESPACE_DIR_CREATED",

            Event::NamespaceCreated => "NAMESPACE_CREATED",
            Event::NamespaceLoaded => "NAMESPACE_LOADED",
            Event::NamespaceLoadFailed => "NAMESPACE_LOAD_FAILED",
            Event::NamespaceScanFailed => "NAMESPACE_SCAN_FAILED",

            Event::BackupStart => "BACKUP_BEGIN",
            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::BackupFailed => "BACKUP_FAILED",

            Event::WriteCommit => "WRITE_COMMIT",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::PayloadCorrupted => "PAYLOAD_CORRUPTED",
            Event::StorageTaskFailed => "STORAGE_TASK_FAILED",

            Event::StreamConnected => "STREAM_CONNECTED",
            Event::EventPublished => "EVENT_PUBLISHED",
            Event::EventPublishFailed => "EVENT_PUBLISH_FAILED",
            Event::ConsumerGroupCreated => "CONSUMER_GROUP_CREATED",
            Event::ConsumerEntryRejected => "CONSUMER_ENTRY_REJECTED",

            Event::RateLimited => "RATE_LIMITED",
            Event::Redirected => "REDIRECTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
