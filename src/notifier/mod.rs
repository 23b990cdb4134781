//! # Change Notifier
//!
//! Best-effort change notifications on capped append-only streams.
//!
//! After a committed write the storage service hands a [`ChangeEvent`] to the
//! [`ChangeNotifier`], which publishes it on `<prefix>.<namespace>` from a
//! detached task. Publication failures never affect the write. Downstream
//! readers join consumer groups through [`StreamConsumer`].

mod consumer;
mod dispatcher;
mod errors;
mod event;
mod memory;
mod publisher;

pub use consumer::{process_batch, BatchOutcome, GroupOptions, StreamConsumer};
pub use dispatcher::{ChangeNotifier, DEFAULT_STREAM_PREFIX};
pub use errors::{NotifyError, NotifyResult};
pub use event::{ChangeEvent, ChangeKind, StreamEntry};
pub use memory::MemoryPublisher;
pub use publisher::{RedisPublisher, StreamPublisher, DEFAULT_MAX_LEN};
