//! Observability subsystem for rawstore
//!
//! This module provides:
//! - Structured logging through `tracing`, keyed by a typed [`Event`]
//! - Process-local operational counters
//!
//! # Usage
//!
//! ```ignore
//! use rawstore::observability::{Event, MetricsRegistry};
//!
//! tracing::info!(event = %Event::NamespaceCreated, namespace = "logs");
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_writes();
//! ```
//!
//! Observability failure must never take the data path down: the only
//! fallible operation here is installing the subscriber at startup.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{init_logging, LogFormat, DEFAULT_FILTER};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use thiserror::Error;

/// Observability errors
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// A global subscriber is already installed, or the filter is invalid
    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;
