//! # HTTP Server Module
//!
//! Axum servers for the two node roles, sharing one middleware stack
//! (request ids, tracing, panic recovery, CORS, per-IP rate limit, body cap).
//!
//! # Endpoints
//!
//! Volume role:
//! - `/status` - Stream settings, namespaces and counters
//! - `/:ns/:key` - Object write (`PUT` upsert, `POST` insert), read, delete
//! - `/:ns`, `/v1/data/:ns` - Paginated records
//! - `/v1/data/:ns/_list` - Paginated keys, newest first
//! - `/v1/namespace` - Namespace list and creation
//! - `/v1/namespace/:ns/_backup` - Hot backup
//!
//! Router role:
//! - `/status`, `/v1/nodes` - Configured nodes
//! - `/v1/locate/:ns/:key` - Owner of a key
//! - `/:ns/:key` - `307` redirect to the owner

pub mod config;
pub mod errors;
pub mod rate_limit;
pub mod router_routes;
pub mod server;
pub mod volume_routes;

pub use config::HttpServerConfig;
pub use errors::{HttpServerError, HttpServerResult};
pub use rate_limit::RateLimiter;
pub use server::HttpServer;
