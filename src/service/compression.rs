//! # Payload Compression
//!
//! Every stored payload is a zstd frame. Compression happens before the
//! payload reaches the storage pool, decompression after it leaves.

use super::errors::{ServiceError, ServiceResult};

/// Default zstd level
pub const DEFAULT_LEVEL: i32 = 3;

/// Compress `data` at `level`
pub fn compress(data: &[u8], level: i32) -> ServiceResult<Vec<u8>> {
    zstd::encode_all(data, level)
        .map_err(|e| ServiceError::Internal(format!("compression failed: {}", e)))
}

/// Decompress a stored payload
///
/// Anything that is not a complete zstd frame is reported as corruption.
pub fn decompress(stored: &[u8]) -> ServiceResult<Vec<u8>> {
    zstd::decode_all(stored)
        .map_err(|_| ServiceError::Internal("stored payload is corrupted".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        let stored = compress(b"", DEFAULT_LEVEL).unwrap();
        assert!(!stored.is_empty());
        assert!(decompress(&stored).unwrap().is_empty());
    }

    #[test]
    fn test_binary_payload() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let stored = compress(&data, DEFAULT_LEVEL).unwrap();
        assert!(stored.len() < data.len());
        assert_eq!(decompress(&stored).unwrap(), data);
    }

    #[test]
    fn test_garbage_is_corruption() {
        let err = decompress(b"definitely not zstd").unwrap_err();
        assert_eq!(err, ServiceError::Internal("stored payload is corrupted".into()));
    }

    #[test]
    fn test_truncated_frame_is_corruption() {
        let stored = compress(b"hello hello hello hello", DEFAULT_LEVEL).unwrap();
        assert!(decompress(&stored[..stored.len() / 2]).is_err());
    }
}
