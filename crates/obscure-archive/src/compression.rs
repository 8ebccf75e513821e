//! Zstandard compression for backup payloads.
//!
//! Payloads are compressed before encryption; compressing ciphertext would
//! achieve nothing. Uses streaming encode/decode so large archives do not
//! need a second full copy in flight.

use std::io::Read;

use obscure_core::{Error, Result};

/// Default zstd level (3 = balanced speed/ratio).
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compress a payload at the given level, or the default.
pub fn compress(data: &[u8], level: Option<i32>) -> Result<Vec<u8>> {
    let level = level.unwrap_or(DEFAULT_COMPRESSION_LEVEL);
    zstd::stream::encode_all(data, level)
        .map_err(|e| Error::compression(format!("zstd encode failed: {}", e)))
}

/// Decompress a zstd payload.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = zstd::stream::Decoder::new(data)
        .map_err(|e| Error::compression(format!("zstd decoder init failed: {}", e)))?;

    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::compression(format!("zstd decode failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let original = b"Repeated content that compresses very well! ".repeat(2000);

        let compressed = compress(&original, None).unwrap();
        assert!(compressed.len() < original.len() / 2);

        let restored = decompress(&compressed).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_empty_payload_round_trips() {
        let compressed = compress(&[], None).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_levels_trade_size() {
        let data = b"some moderately repetitive data ".repeat(1000);

        let fast = compress(&data, Some(1)).unwrap();
        let best = compress(&data, Some(19)).unwrap();
        assert!(best.len() <= fast.len());
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let err = decompress(b"this is not zstd data").unwrap_err();
        assert!(matches!(err, obscure_core::Error::Compression { .. }));
    }
}
