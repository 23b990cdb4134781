//! # Namespace Store
//!
//! Namespace-isolated persistence of raw records.
//!
//! Each namespace is one SQLite database file holding a single `data`
//! table keyed by `data_id`. The store works on the bytes it is given; the
//! service layer is responsible for compressing them first.
//!
//! Operations:
//! - `create` / `load`: namespace lifecycle (never deleted here)
//! - `insert` / `upsert` / `get` / `delete`: single-record CRUD
//! - `list` / `list_keys`: paginated listings
//! - `backup`: online copy through the SQLite backup API

pub mod errors;
pub mod schema;
pub mod store;
pub mod types;
pub mod unit;

pub use errors::{StoreError, StoreResult};
pub use schema::{backup_path, unit_path, validate_name, DEFAULT_NAMESPACE};
pub use store::NamespaceStore;
pub use types::{KeyEntry, Namespace, Page, Pagination, Record};
pub use unit::NamespaceUnit;
