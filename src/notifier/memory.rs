//! # In-Memory Publisher
//!
//! Process-local stand-in for the stream broker, injected in tests in place
//! of [`RedisPublisher`](super::RedisPublisher). Mirrors the broker's
//! observable behavior: monotonic `<millis>-<seq>` ids and lazy,
//! approximate trimming.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::errors::{NotifyError, NotifyResult};
use super::event::{ChangeEvent, StreamEntry};
use super::publisher::StreamPublisher;

#[derive(Debug, Default)]
struct MemoryState {
    streams: HashMap<String, VecDeque<StreamEntry>>,
    last_millis: i64,
    seq: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        if now > self.last_millis {
            self.last_millis = now;
            self.seq = 0;
        } else {
            self.seq += 1;
        }
        format!("{}-{}", self.last_millis, self.seq)
    }
}

/// Broker double holding streams in memory
#[derive(Debug)]
pub struct MemoryPublisher {
    max_len: u64,
    state: Mutex<MemoryState>,
    failing: AtomicBool,
}

impl MemoryPublisher {
    pub fn new(max_len: u64) -> Self {
        Self {
            max_len,
            state: Mutex::new(MemoryState::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent publish fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of `stream`, oldest first
    pub fn entries(&self, stream: &str) -> Vec<StreamEntry> {
        self.state
            .lock()
            .map(|s| {
                s.streams
                    .get(stream)
                    .map(|entries| entries.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Names of streams that received at least one entry
    pub fn streams(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .map(|s| s.streams.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Entries allowed above the cap before a trim happens
    fn slack(&self) -> u64 {
        (self.max_len / 10).max(1)
    }
}

#[async_trait]
impl StreamPublisher for MemoryPublisher {
    async fn publish(&self, stream: &str, event: &ChangeEvent) -> NotifyResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("memory publisher set to fail".to_string()));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::Unavailable("publisher lock poisoned".to_string()))?;
        let id = state.next_id();
        let fields: BTreeMap<String, String> = event
            .fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let cap = self.max_len as usize;
        let slack = self.slack() as usize;
        let entries = state.streams.entry(stream.to_string()).or_default();
        entries.push_back(StreamEntry {
            stream: stream.to_string(),
            id: id.clone(),
            fields,
        });
        if entries.len() > cap + slack {
            let excess = entries.len() - cap;
            entries.drain(..excess);
        }

        Ok(id)
    }

    fn max_len(&self) -> u64 {
        self.max_len
    }
}
