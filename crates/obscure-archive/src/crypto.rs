//! Password-based encryption for backup payloads.
//!
//! A payload is sealed into a self-contained frame:
//!
//! ```text
//! [0..16]  scrypt salt
//! [16..28] AES-GCM nonce
//! [28..]   ciphertext || 16-byte GCM tag
//! ```
//!
//! The key is derived with scrypt (N=2^15, r=8, p=1, 32-byte output). Salt
//! and nonce are freshly random per frame, so encrypting the same payload
//! twice yields different frames. A failed open means the password was wrong
//! or the frame was tampered with; GCM cannot distinguish the two.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use obscure_core::{Error, Result};
use scrypt::Params;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;

/// Frame header length preceding the ciphertext.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// scrypt cost parameters. log2(N)=15, r=8, p=1.
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Derive a 32-byte AES key from a password and salt.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| Error::crypto(format!("invalid scrypt parameters: {}", e)))?;

    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key)
        .map_err(|e| Error::crypto(format!("key derivation failed: {}", e)))?;
    Ok(key)
}

/// Seal a payload into an encrypted frame.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| Error::crypto("encryption failed"))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    frame.extend_from_slice(&salt);
    frame.extend_from_slice(&nonce_bytes);
    frame.extend_from_slice(&ciphertext);
    Ok(frame)
}

/// Open an encrypted frame with the given password.
pub fn decrypt(frame: &[u8], password: &str) -> Result<Vec<u8>> {
    if frame.len() < HEADER_LEN + TAG_LEN {
        return Err(Error::crypto(format!(
            "encrypted payload is too short ({} bytes)",
            frame.len()
        )));
    }

    let salt = &frame[..SALT_LEN];
    let nonce = &frame[SALT_LEN..HEADER_LEN];
    let ciphertext = &frame[HEADER_LEN..];

    let key = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::crypto("decryption failed: wrong password or corrupted data"))
}
