//! # Stream Publishers
//!
//! A publisher appends one entry per change event to a capped,
//! append-only stream. The broker assigns entry ids; the cap is
//! approximate, so a stream may briefly hold more than `max_len` entries.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::observability::Event;

use super::errors::{NotifyError, NotifyResult};
use super::event::ChangeEvent;

/// Default approximate stream length cap
pub const DEFAULT_MAX_LEN: u64 = 1000;

/// Append-only stream sink for change events
#[async_trait]
pub trait StreamPublisher: Send + Sync {
    /// Append `event` to `stream`, returning the broker-assigned entry id
    async fn publish(&self, stream: &str, event: &ChangeEvent) -> NotifyResult<String>;

    /// Approximate length cap applied on every append
    fn max_len(&self) -> u64;
}

/// Redis Streams publisher (`XADD ... MAXLEN ~`)
///
/// Wraps a connection manager that reconnects on its own; clones share the
/// underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisPublisher {
    conn: ConnectionManager,
    max_len: u64,
}

impl RedisPublisher {
    /// Connect to the broker at `url` (e.g. `redis://localhost:6379/0`)
    pub async fn connect(url: &str, max_len: u64) -> NotifyResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| NotifyError::Unavailable(format!("invalid broker url '{}': {}", url, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| NotifyError::Unavailable(e.to_string()))?;

        tracing::info!(event = %Event::StreamConnected, max_len);
        Ok(Self::from_connection(conn, max_len))
    }

    /// Build from an already established connection
    pub fn from_connection(conn: ConnectionManager, max_len: u64) -> Self {
        Self { conn, max_len }
    }

    /// Shared connection, for consumers on the same broker
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl StreamPublisher for RedisPublisher {
    async fn publish(&self, stream: &str, event: &ChangeEvent) -> NotifyResult<String> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(stream).arg("MAXLEN").arg("~").arg(self.max_len).arg("*");
        for (field, value) in event.fields() {
            cmd.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let id: String = cmd.query_async(&mut conn).await?;
        Ok(id)
    }

    fn max_len(&self) -> u64 {
        self.max_len
    }
}
