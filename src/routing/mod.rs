//! # Key Routing
//!
//! Deterministic placement of keys onto a fixed set of storage nodes.
//!
//! - [`assign`]: jump consistent hash of a key into `[0, n)`
//! - [`NodeTable`]: bucket index to node address
//!
//! Placement is recomputed on every request and never stored. Adding a node
//! changes where some keys are looked up but does not move their data.

pub mod errors;
pub mod hash;
pub mod nodes;

pub use errors::{RoutingError, RoutingResult};
pub use hash::{assign, hash_key};
pub use nodes::{NodeAssignment, NodeTable};
