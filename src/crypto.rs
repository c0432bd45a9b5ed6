//! Authenticated encryption primitives.

use crate::format::VERSION;
use crate::types::EncDirError;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use getrandom::fill as getrandom;

/// AEAD authentication tag length in bytes.
pub const AEAD_TAG_LEN: usize = 16;

/// XChaCha20-Poly1305 nonce length in bytes. The extended nonce makes
/// random generation safe without a counter.
pub const NONCE_LEN: usize = 24;

/// KDF salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Generate a cryptographically secure random nonce.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], EncDirError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom(&mut nonce).map_err(|_| EncDirError::Crypto)?;
    Ok(nonce)
}

/// Generate a cryptographically secure random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], EncDirError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom(&mut salt).map_err(|_| EncDirError::Crypto)?;
    Ok(salt)
}

/// Associated data bound into every seal/open: the format version byte and
/// the per-backup salt. Binding them prevents a ciphertext from being spliced
/// into a container with a different version or salt.
fn associated_data(salt: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + salt.len());
    aad.push(VERSION);
    aad.extend_from_slice(salt);
    aad
}

/// Encrypt the archive under `key` and `nonce`. The returned ciphertext has
/// the 16-byte authentication tag appended.
pub fn seal(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_LEN],
    salt: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, EncDirError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| EncDirError::Crypto)?;
    let nonce = XNonce::from_slice(nonce_bytes);
    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &associated_data(salt),
            },
        )
        .map_err(|_| EncDirError::Crypto)
}

/// Decrypt and verify a ciphertext produced by [`seal`].
///
/// # Errors
///
/// Returns `EncDirError::Crypto` if the tag check fails. A wrong passphrase
/// and a tampered ciphertext are indistinguishable here.
pub fn open(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_LEN],
    salt: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EncDirError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| EncDirError::Crypto)?;
    let nonce = XNonce::from_slice(nonce_bytes);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: &associated_data(salt),
            },
        )
        .map_err(|_| EncDirError::Crypto)
}
