//! # Namespace Store Types

use std::path::PathBuf;

use serde::Serialize;

use super::errors::{StoreError, StoreResult};

/// Descriptor of a registered namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub name: String,
    pub path: PathBuf,
    /// Whether writes to this namespace emit change events
    pub stream: bool,
}

/// One stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Bytes exactly as stored (compressed by the service layer)
    pub data: Vec<u8>,
    /// Set on first insert, never updated on overwrite
    pub created_at: String,
}

/// Key listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEntry {
    #[serde(rename = "dataID")]
    pub key: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Validated page request
///
/// Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Default page size when the caller gives none
    pub const DEFAULT_LIMIT: u32 = 50;

    /// Validate raw query values; both must be at least 1
    pub fn new(page: i64, limit: i64) -> StoreResult<Self> {
        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| StoreError::InvalidArgument(format!("page must be >= 1, got {}", page)))?;
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!("limit must be >= 1, got {}", limit))
            })?;
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip, saturating at `i64::MAX` (the engine's OFFSET type)
    pub fn offset(&self) -> i64 {
        let skipped = self.limit as u64 * (self.page as u64 - 1);
        i64::try_from(skipped).unwrap_or(i64::MAX)
    }

    /// Next page number, or -1 once `limit * page` covers `total`
    pub fn next_page(&self, total: u64) -> i64 {
        let covered = self.limit as u64 * self.page as u64;
        if covered >= total {
            -1
        } else {
            self.page as i64 + 1
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub next: i64,
}

impl<T> Page<T> {
    /// Convert every row, failing on the first error
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let rows = self.rows.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            rows,
            total: self.total,
            next: self.next,
        })
    }
}
