#![forbid(unsafe_code)]
//! # enc_dir — password-protected directory backups.
//!
//! `enc_dir` packs a directory tree into a single tamper-evident container
//! file and restores it exactly. The archive (gzipped CBOR entries) is sealed
//! with XChaCha20-Poly1305 under a key stretched from the passphrase with
//! scrypt; the container header binds a fresh random salt and nonce per
//! backup.
//!
//! ## Features
//! - **Whole-directory backup/restore** preserving relative paths, file
//!   contents, and unix mode bits
//! - **Authenticated encryption**: any tampering, truncation, or wrong
//!   passphrase is detected before a single byte is written
//! - **Path-traversal hardening**: archive entry paths are validated against
//!   the destination root before unpacking
//! - **Atomic persistence**: containers are written via temp file + rename
//!
//! ## Example: back up and restore a directory
//! ```no_run
//! use enc_dir::{backup, restore, BackupOptions};
//! use secrecy::SecretString;
//! use std::path::Path;
//!
//! let password = SecretString::new("mypassword".into());
//! let opts = BackupOptions::default();
//!
//! let container = backup(Path::new("profiles"), None, &password, &opts).unwrap();
//! restore(&container, Path::new("profiles_restored"), &password, &opts).unwrap();
//! ```
//!
//! Safety notes
//! - Key zeroization is best-effort defense-in-depth, not a guaranteed
//!   erasure. Protects data at rest; does not defend against compromised
//!   hosts or side channels.

pub mod archive;
pub mod crypto;
pub mod format;
pub mod kdf;

mod file;
mod types;

// Re-export public API from modules
pub use file::{CONTAINER_EXT, backup, backup_to_bytes, default_container_path, restore,
    restore_from_bytes};
pub use types::*;
