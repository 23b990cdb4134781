//! # Node Table
//!
//! Fixed, ordered list of storage-node base URLs. Bucket `i` is owned by the
//! `i`-th address, so every router must be configured with the same list in
//! the same order; diverging lists silently route the same key differently.

use serde::Serialize;

use super::errors::{RoutingError, RoutingResult};
use super::hash::assign;

/// Owner of a key as decided by the node table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAssignment {
    /// Base URL of the owning node
    #[serde(rename = "address")]
    pub address: String,
    /// Bucket index of the owning node
    #[serde(rename = "jumpNode")]
    pub bucket: u32,
}

/// Ordered storage-node addresses
#[derive(Debug, Clone)]
pub struct NodeTable {
    nodes: Vec<String>,
}

impl NodeTable {
    /// Build a table from raw addresses
    ///
    /// Addresses without a scheme get `http://`; trailing slashes are
    /// stripped. An empty list is rejected.
    pub fn new<I, S>(addresses: I) -> RoutingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nodes = addresses
            .into_iter()
            .map(|a| normalize_address(a.as_ref()))
            .collect::<RoutingResult<Vec<_>>>()?;

        if nodes.is_empty() {
            return Err(RoutingError::InvalidArgument(
                "node list must contain at least one address".to_string(),
            ));
        }
        Ok(Self { nodes })
    }

    /// Configured addresses in bucket order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Number of nodes (the bucket count)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; construction rejects an empty list
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node owning `key`
    pub fn owner(&self, key: impl AsRef<[u8]>) -> RoutingResult<NodeAssignment> {
        let count = u32::try_from(self.nodes.len())
            .map_err(|_| RoutingError::InvalidArgument("too many nodes".to_string()))?;
        let bucket = assign(key, count)?;
        Ok(NodeAssignment {
            address: self.nodes[bucket as usize].clone(),
            bucket,
        })
    }
}

fn normalize_address(raw: &str) -> RoutingResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RoutingError::InvalidArgument(format!(
            "invalid node address: '{}'",
            raw
        )));
    }
    if trimmed.contains("://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{}", trimmed))
    }
}
