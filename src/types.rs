//! Core types and enums for enc_dir.

use thiserror::Error;

/// Tunable scrypt cost parameters.
///
/// The same parameters must be used for backup and restore; the container
/// format does not persist them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// log2 of the scrypt iteration count N.
    pub log_n: u8,
    /// Block size factor r.
    pub r: u32,
    /// Parallelism factor p.
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // N = 2^15, r = 8, p = 1 (~32 MiB per derivation).
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

/// Options for a backup or restore call.
///
/// Explicit per-call configuration; there is no process-wide mutable state,
/// so concurrent callers with different policies cannot race.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub kdf_params: KdfParams,
    /// When `true`, allow overwriting an existing container file.
    pub force: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            kdf_params: KdfParams::default(),
            force: false,
        }
    }
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum EncDirError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// AEAD tag verification failed: wrong passphrase or tampered ciphertext.
    /// Deliberately undifferentiated so callers cannot build an oracle.
    #[error("encryption/decryption failure")]
    Crypto,
    #[error("key derivation failure")]
    Kdf,
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),
    /// Bad magic, truncated header, or ciphertext length mismatch.
    #[error("malformed container")]
    Malformed,
    /// The decrypted payload is not a valid archive.
    #[error("malformed archive")]
    BadArchive,
    /// An archive entry path would resolve outside the destination directory.
    #[error("archive entry escapes destination directory")]
    PathEscape,
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}
