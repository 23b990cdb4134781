//! # Change Notifier
//!
//! Fire-and-forget emission of change events.
//!
//! `notify` spawns a detached task per event and returns immediately. The
//! write that produced the event is already committed; a failed publish is
//! logged and counted, never retried and never reported back to the writer.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::observability::{Event, MetricsRegistry};

use super::errors::NotifyResult;
use super::event::ChangeEvent;
use super::publisher::StreamPublisher;

/// Default prefix of per-namespace stream names
pub const DEFAULT_STREAM_PREFIX: &str = "RD";

/// Publishes change events to `<prefix>.<namespace>` streams
#[derive(Clone)]
pub struct ChangeNotifier {
    publisher: Arc<dyn StreamPublisher>,
    prefix: String,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ChangeNotifier {
    pub fn new(publisher: Arc<dyn StreamPublisher>, prefix: impl Into<String>) -> Self {
        Self {
            publisher,
            prefix: prefix.into(),
            metrics: None,
        }
    }

    /// Count published and dropped events in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stream name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Approximate per-stream length cap of the underlying publisher
    pub fn max_len(&self) -> u64 {
        self.publisher.max_len()
    }

    /// Stream receiving events of `namespace`
    pub fn stream_for(&self, namespace: &str) -> String {
        format!("{}.{}", self.prefix, namespace)
    }

    /// Publish and wait for the broker's reply
    pub async fn publish(&self, event: &ChangeEvent) -> NotifyResult<String> {
        let stream = self.stream_for(&event.namespace);
        let result = self.publisher.publish(&stream, event).await;

        match &result {
            Ok(id) => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_events_published();
                }
                tracing::debug!(
                    event = %Event::EventPublished,
                    stream = %stream,
                    id = %id,
                    key = %event.key,
                );
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_events_failed();
                }
                tracing::warn!(
                    event = %Event::EventPublishFailed,
                    stream = %stream,
                    key = %event.key,
                    error = %e,
                );
            }
        }
        result
    }

    /// Publish on a detached task
    ///
    /// Must be called from within a tokio runtime. The handle is only for
    /// tests; callers on the write path drop it.
    pub fn notify(&self, event: ChangeEvent) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            let _ = notifier.publish(&event).await;
        })
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("prefix", &self.prefix)
            .field("max_len", &self.publisher.max_len())
            .finish()
    }
}
