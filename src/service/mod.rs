//! # Storage Service
//!
//! Request orchestration between the HTTP layer and the namespace store:
//! payload compression, blocking-pool dispatch, change notification and the
//! error categories the HTTP layer renders.

mod compression;
mod errors;
mod storage;

pub use compression::{compress, decompress, DEFAULT_LEVEL as DEFAULT_COMPRESSION_LEVEL};
pub use errors::{ErrorResponse, ServiceError, ServiceResult};
pub use storage::{ServiceConfig, StatusReport, StorageService};
