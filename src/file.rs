//! Backup and restore orchestration.
//!
//! Backup: pack → derive (fresh salt) → seal (fresh nonce) → encode → write.
//! Restore: read → decode → derive (stored salt) → open (stored nonce) → unpack.
//!
//! Both are synchronous and blocking; key derivation in particular holds the
//! calling thread for the full cost-function run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::SecretString;
use tempfile::NamedTempFile;

use crate::archive;
use crate::crypto;
use crate::format;
use crate::kdf;
use crate::types::{BackupOptions, EncDirError};

/// Extension appended to the source directory name for the default output path.
pub const CONTAINER_EXT: &str = "edir";

/// Encrypt `src_dir` into container bytes.
///
/// Salt and nonce are freshly random per call, so two backups of an unchanged
/// tree produce different containers that both restore to the same content.
pub fn backup_to_bytes(
    src_dir: &Path,
    password: &SecretString,
    opts: &BackupOptions,
) -> Result<Vec<u8>, EncDirError> {
    let archive = archive::pack(src_dir)?;

    let salt = crypto::generate_salt()?;
    let nonce = crypto::generate_nonce()?;
    let key = kdf::derive_key(password, opts.kdf_params, &salt)?;
    let ciphertext = crypto::seal(&key, &nonce, &salt, &archive)?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(format::encode_container(&salt, &nonce, timestamp, &ciphertext))
}

/// Decrypt container bytes and unpack them into `dest_dir`.
///
/// Decode, key derivation, and tag verification all complete before `dest_dir`
/// is created, so a wrong passphrase or corrupt container leaves the
/// filesystem untouched.
pub fn restore_from_bytes(
    container: &[u8],
    password: &SecretString,
    dest_dir: &Path,
    opts: &BackupOptions,
) -> Result<(), EncDirError> {
    let parsed = format::decode_container(container)?;
    let key = kdf::derive_key(password, opts.kdf_params, &parsed.salt)?;
    let archive = crypto::open(&key, &parsed.nonce, &parsed.salt, &parsed.ciphertext)?;

    fs::create_dir_all(dest_dir)?;
    archive::unpack(&archive, dest_dir)
}

/// Back up `src_dir` to a container file and return its path.
///
/// If `output` is omitted, `.edir` is appended to the source directory name.
/// The container is written via a temp file in the target directory and
/// renamed into place, so a crash mid-write cannot leave a half-written file
/// at the final path.
pub fn backup(
    src_dir: &Path,
    output: Option<&Path>,
    password: &SecretString,
    opts: &BackupOptions,
) -> Result<PathBuf, EncDirError> {
    let out = default_container_path(src_dir, output);
    let bytes = backup_to_bytes(src_dir, password, opts)?;

    if out.exists() && !opts.force {
        return Err(EncDirError::Invalid("output exists; use force to overwrite"));
    }
    write_all_atomic(&out, &bytes)?;
    Ok(out)
}

/// Restore the container file at `input` into `dest_dir`.
pub fn restore(
    input: &Path,
    dest_dir: &Path,
    password: &SecretString,
    opts: &BackupOptions,
) -> Result<(), EncDirError> {
    let bytes = fs::read(input)?;
    restore_from_bytes(&bytes, password, dest_dir, opts)
}

/// Default container path: the provided output, or the source directory name
/// with `.edir` appended (preserving any existing extension).
pub fn default_container_path(src_dir: &Path, output: Option<&Path>) -> PathBuf {
    output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let mut p = src_dir.to_path_buf();
        if let Some(e) = src_dir.extension().and_then(|s| s.to_str()) {
            p.set_extension(format!("{e}.{CONTAINER_EXT}"));
        } else {
            p.set_extension(CONTAINER_EXT);
        }
        p
    })
}

/// Atomically write data to `path` with mode 0600 on unix.
fn write_all_atomic(path: &Path, data: &[u8]) -> Result<(), EncDirError> {
    let parent = path
        .parent()
        .ok_or(EncDirError::Invalid("output path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| EncDirError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_appends_extension() {
        assert_eq!(
            default_container_path(Path::new("/tmp/profiles"), None),
            PathBuf::from("/tmp/profiles.edir")
        );
        assert_eq!(
            default_container_path(Path::new("/tmp/my.stuff"), None),
            PathBuf::from("/tmp/my.stuff.edir")
        );
        assert_eq!(
            default_container_path(Path::new("/tmp/profiles"), Some(Path::new("/x/out.bin"))),
            PathBuf::from("/x/out.bin")
        );
    }
}
