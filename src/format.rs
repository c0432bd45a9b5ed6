//! On-disk container format.
//!
//! Layout, all fields in fixed order:
//!
//! | field             | size | notes                                   |
//! |-------------------|------|-----------------------------------------|
//! | magic             | 4    | `b"EDIR"`                               |
//! | version           | 1    | unknown values are rejected             |
//! | salt              | 16   | random per backup                       |
//! | nonce             | 24   | random per backup                       |
//! | timestamp         | 8 BE | creation time (unix secs), informational |
//! | ciphertext length | 8 BE | must match the remaining byte count     |
//! | ciphertext        | var  | AEAD output, tag appended               |
//!
//! The timestamp is deliberately outside the authenticated data: nothing in
//! restore consults it, so an attacker altering it gains nothing.

use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::types::EncDirError;

pub const MAGIC: &[u8; 4] = b"EDIR";
pub const VERSION: u8 = 1;

/// Fixed header length preceding the ciphertext.
pub const HEADER_LEN: usize = 4 + 1 + SALT_LEN + NONCE_LEN + 8 + 8;

/// Parsed container fields.
#[derive(Debug, Clone)]
pub struct Container {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Creation time in unix seconds. Not authenticated; informational only.
    pub timestamp: u64,
    pub ciphertext: Vec<u8>,
}

/// Serialize a container: fixed header immediately followed by ciphertext.
pub fn encode_container(
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    timestamp: u64,
    ciphertext: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(salt);
    out.extend_from_slice(nonce);
    out.extend_from_slice(&timestamp.to_be_bytes());
    out.extend_from_slice(&(ciphertext.len() as u64).to_be_bytes());
    out.extend_from_slice(ciphertext);
    out
}

/// Parse and validate a container.
///
/// # Errors
///
/// - `EncDirError::Malformed` — input shorter than the header, wrong magic,
///   or declared ciphertext length not equal to the remaining bytes (catches
///   both truncation and trailing garbage).
/// - `EncDirError::UnsupportedVersion` — version byte we do not understand.
pub fn decode_container(bytes: &[u8]) -> Result<Container, EncDirError> {
    if bytes.len() < HEADER_LEN {
        return Err(EncDirError::Malformed);
    }
    let mut off = 0;
    if &bytes[..4] != MAGIC {
        return Err(EncDirError::Malformed);
    }
    off += 4;
    if bytes[off] != VERSION {
        return Err(EncDirError::UnsupportedVersion(bytes[off]));
    }
    off += 1;

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[off..off + SALT_LEN]);
    off += SALT_LEN;

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[off..off + NONCE_LEN]);
    off += NONCE_LEN;

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[off..off + 8]);
    let timestamp = u64::from_be_bytes(buf);
    off += 8;
    buf.copy_from_slice(&bytes[off..off + 8]);
    let ct_len = u64::from_be_bytes(buf);
    off += 8;

    if ct_len != (bytes.len() - off) as u64 {
        return Err(EncDirError::Malformed);
    }

    Ok(Container {
        salt,
        nonce,
        timestamp,
        ciphertext: bytes[off..].to_vec(),
    })
}
