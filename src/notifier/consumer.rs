//! # Stream Consumer
//!
//! Competing consumers over Redis consumer groups.
//!
//! Members of a group pull new entries with `XREADGROUP`, hand each one to a
//! caller-supplied handler and acknowledge only the entries the handler
//! accepted. A rejected entry stays in the group's pending list and is
//! delivered again, so delivery is at-least-once.

use std::collections::BTreeMap;
use std::fmt::Display;

use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use crate::observability::Event;

use super::errors::{NotifyError, NotifyResult};
use super::event::StreamEntry;

/// Reply code for `XGROUP CREATE` on an existing group
const BUSYGROUP: &str = "BUSYGROUP";

/// Options for one `XREADGROUP` round
#[derive(Debug, Clone)]
pub struct GroupOptions {
    /// Streams to read from
    pub streams: Vec<String>,
    /// Maximum entries per stream per round
    pub count: usize,
    /// Milliseconds to block waiting for entries; `None` returns immediately
    pub block: Option<usize>,
}

impl GroupOptions {
    pub fn new(streams: Vec<String>) -> Self {
        Self {
            streams,
            count: 10,
            block: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_block(mut self, millis: usize) -> Self {
        self.block = Some(millis);
        self
    }
}

/// Result of handing a batch to a handler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Entries to acknowledge, keyed by stream
    pub acked: BTreeMap<String, Vec<String>>,
    /// Entries left pending, as `(stream, id)`
    pub rejected: Vec<(String, String)>,
}

impl BatchOutcome {
    pub fn acked_count(&self) -> usize {
        self.acked.values().map(Vec::len).sum()
    }
}

/// Run `handler` over `entries`, splitting them into acknowledged and pending
pub fn process_batch<F, E>(entries: &[StreamEntry], mut handler: F) -> BatchOutcome
where
    F: FnMut(&StreamEntry) -> Result<(), E>,
    E: Display,
{
    let mut outcome = BatchOutcome::default();

    for entry in entries {
        match handler(entry) {
            Ok(()) => outcome
                .acked
                .entry(entry.stream.clone())
                .or_default()
                .push(entry.id.clone()),
            Err(e) => {
                tracing::warn!(
                    event = %Event::ConsumerEntryRejected,
                    stream = %entry.stream,
                    id = %entry.id,
                    error = %e,
                );
                outcome.rejected.push((entry.stream.clone(), entry.id.clone()));
            }
        }
    }

    outcome
}

/// One member of a consumer group
pub struct StreamConsumer {
    conn: ConnectionManager,
    group: String,
    consumer_id: String,
}

impl StreamConsumer {
    pub fn new(conn: ConnectionManager, group: impl Into<String>, consumer_id: impl Into<String>) -> Self {
        Self {
            conn,
            group: group.into(),
            consumer_id: consumer_id.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    /// Create the group on `stream` starting at `start` (`$` for new entries
    /// only, `0` for the whole stream). An existing group is not an error.
    pub async fn ensure_group(&self, stream: &str, start: &str) -> NotifyResult<()> {
        let mut conn = self.conn.clone();
        let created: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(stream, &self.group, start)
            .await;

        match created {
            Ok(()) => {
                tracing::info!(
                    event = %Event::ConsumerGroupCreated,
                    stream = %stream,
                    group = %self.group,
                );
                Ok(())
            }
            Err(e) if e.code() == Some(BUSYGROUP) => Ok(()),
            Err(e) => Err(NotifyError::Broker(e)),
        }
    }

    /// Read one round of new entries and acknowledge the accepted ones
    pub async fn read_group<F, E>(&self, opts: &GroupOptions, handler: F) -> NotifyResult<BatchOutcome>
    where
        F: FnMut(&StreamEntry) -> Result<(), E>,
        E: Display,
    {
        if opts.streams.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut read_opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer_id)
            .count(opts.count);
        if let Some(block) = opts.block {
            read_opts = read_opts.block(block);
        }

        let ids: Vec<&str> = vec![">"; opts.streams.len()];
        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = conn
            .xread_options(opts.streams.as_slice(), ids.as_slice(), &read_opts)
            .await?;

        let entries = match reply {
            Some(reply) => decode_reply(reply)?,
            None => return Ok(BatchOutcome::default()),
        };

        let outcome = process_batch(&entries, handler);
        for (stream, ids) in &outcome.acked {
            let _: u64 = conn.xack(stream, &self.group, ids.as_slice()).await?;
        }

        Ok(outcome)
    }
}

fn decode_reply(reply: StreamReadReply) -> NotifyResult<Vec<StreamEntry>> {
    let mut entries = Vec::new();

    for key in reply.keys {
        for stream_id in key.ids {
            let mut fields = BTreeMap::new();
            for (field, value) in stream_id.map {
                let value: String = redis::from_redis_value(&value).map_err(|e| {
                    NotifyError::MalformedEntry {
                        id: stream_id.id.clone(),
                        reason: format!("field '{}': {}", field, e),
                    }
                })?;
                fields.insert(field, value);
            }
            entries.push(StreamEntry {
                stream: key.key.clone(),
                id: stream_id.id,
                fields,
            });
        }
    }

    Ok(entries)
}
