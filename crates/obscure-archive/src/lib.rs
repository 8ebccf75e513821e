//! # obscure-archive
//!
//! Payload preparation for the Obscure CLI:
//! - Tar archiving of directories (single files pass through untouched)
//! - Zstandard compression
//! - Password-based encryption (scrypt key derivation + AES-256-GCM)
//! - Progress reporting for long-running phases

pub mod archive;
pub mod compression;
pub mod crypto;
pub mod progress;

pub use archive::{create_archive, extract_archive, looks_like_tar, ArchiveOutput};
pub use compression::{compress, decompress, DEFAULT_COMPRESSION_LEVEL};
pub use crypto::{decrypt, derive_key, encrypt, HEADER_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
pub use progress::PipelineProgress;

/// Seal a payload for upload: compress, then encrypt.
pub fn seal(payload: &[u8], password: &str) -> obscure_core::Result<Vec<u8>> {
    let compressed = compression::compress(payload, None)?;
    crypto::encrypt(&compressed, password)
}

/// Open a downloaded frame: decrypt, then decompress.
pub fn open(frame: &[u8], password: &str) -> obscure_core::Result<Vec<u8>> {
    let compressed = crypto::decrypt(frame, password)?;
    compression::decompress(&compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let payload = b"backup bytes that should survive the full pipeline".repeat(100);

        let frame = seal(&payload, "passphrase").unwrap();
        assert_ne!(frame, payload);
        assert_eq!(open(&frame, "passphrase").unwrap(), payload);
    }

    #[test]
    fn test_open_with_wrong_password_fails() {
        let frame = seal(b"payload", "right").unwrap();
        assert!(open(&frame, "wrong").is_err());
    }
}
