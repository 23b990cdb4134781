//! # Jump Consistent Hash
//!
//! Maps a key to one of `n` buckets such that growing `n` to `n + 1` only
//! moves the keys that land in the new bucket (about `1 / (n + 1)` of them).
//!
//! Keys are first reduced to 64 bits with XXH64 (seed 0). The hash choice
//! is part of the routing contract: every router in a deployment must agree
//! on it, so it is fixed here rather than configurable.

use xxhash_rust::xxh64::xxh64;

use super::errors::{RoutingError, RoutingResult};

/// Multiplier of the linear congruential step.
const LCG_MULTIPLIER: u64 = 2862933555777941757;

/// Seed for the key hash.
const KEY_HASH_SEED: u64 = 0;

/// Reduce a key to the 64-bit value fed into the bucket recurrence
pub fn hash_key(key: &[u8]) -> u64 {
    xxh64(key, KEY_HASH_SEED)
}

/// Jump consistent hash over a pre-hashed key.
///
/// `num_buckets` must be non-zero; callers go through [`assign`].
fn jump_hash(mut key: u64, num_buckets: u32) -> u32 {
    let mut bucket: i64 = -1;
    let mut candidate: i64 = 0;

    while candidate < num_buckets as i64 {
        bucket = candidate;
        key = key.wrapping_mul(LCG_MULTIPLIER).wrapping_add(1);
        let fraction = (1u64 << 31) as f64 / ((key >> 33) + 1) as f64;
        candidate = ((bucket + 1) as f64 * fraction) as i64;
    }

    bucket as u32
}

/// Assign `key` to a bucket in `[0, num_buckets)`.
///
/// Deterministic for a given `(key, num_buckets)`. A zero bucket count is
/// rejected instead of producing an index into an empty node list.
pub fn assign(key: impl AsRef<[u8]>, num_buckets: u32) -> RoutingResult<u32> {
    if num_buckets == 0 {
        return Err(RoutingError::InvalidArgument(
            "bucket count must be at least 1".to_string(),
        ));
    }
    Ok(jump_hash(hash_key(key.as_ref()), num_buckets))
}
