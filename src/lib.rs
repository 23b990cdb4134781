//! rawstore - A namespace-partitioned raw object store
//!
//! Storage nodes keep one SQLite file per namespace and optionally publish
//! change events to capped Redis streams; a stateless router maps each key
//! to its owning node with jump consistent hashing.

pub mod cli;
pub mod http_server;
pub mod namespace;
pub mod notifier;
pub mod observability;
pub mod routing;
pub mod service;
