//! Directory tree serialization.
//!
//! An archive is a gzip-compressed CBOR list of entries. Each entry records a
//! slash-separated relative path, a kind tag, unix mode bits, and (for
//! regular files) the raw content. Enumeration follows whatever order the
//! filesystem yields, so two packs of the same tree may differ byte-for-byte
//! while unpacking to the same result.

use std::fs;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::types::EncDirError;

/// Entry kind tags. Stored as a raw byte so that readers can skip kinds they
/// do not recognize instead of failing to parse the whole archive.
pub const KIND_DIR: u8 = 0;
pub const KIND_FILE: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Relative path, forward-slash separated on every platform.
    pub path: String,
    pub kind: u8,
    /// Permission bits (low 12 bits of the unix mode).
    pub mode: u32,
    /// File content; empty for directories.
    pub data: Vec<u8>,
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &fs::Metadata) -> u32 {
    if meta.is_dir() { 0o755 } else { 0o644 }
}

/// Join path components with forward slashes for portability.
fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Serialize a directory tree rooted at `root` (excluding the root entry
/// itself) into archive bytes.
pub fn pack(root: &Path) -> Result<Vec<u8>, EncDirError> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root).min_depth(1) {
        let item = item.map_err(std::io::Error::from)?;
        let ft = item.file_type();
        // Symlinks and special files are not archived.
        let kind = if ft.is_dir() {
            KIND_DIR
        } else if ft.is_file() {
            KIND_FILE
        } else {
            continue;
        };
        let rel = item
            .path()
            .strip_prefix(root)
            .map_err(|_| EncDirError::Invalid("walked entry outside root"))?;
        let meta = item.metadata().map_err(std::io::Error::from)?;
        let data = if kind == KIND_FILE {
            fs::read(item.path())?
        } else {
            Vec::new()
        };
        entries.push(ArchiveEntry {
            path: slash_path(rel),
            kind,
            mode: mode_of(&meta),
            data,
        });
    }
    encode_entries(&entries)
}

/// Recreate a directory tree from archive bytes under `dest`.
///
/// Every entry path is treated as untrusted input (the archive may come from
/// an externally supplied container): empty paths are malformed, and any path
/// that is absolute or contains a parent-directory component is rejected
/// before a single filesystem write happens. Directories are created first,
/// then files; directory modes are applied last so a restrictive directory
/// mode cannot block the file writes inside it.
pub fn unpack(archive: &[u8], dest: &Path) -> Result<(), EncDirError> {
    let entries = decode_entries(archive)?;

    // Resolve and validate all targets before mutating anything.
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in &entries {
        resolved.push(entry_target(dest, &entry.path)?);
    }

    for (entry, target) in entries.iter().zip(&resolved) {
        if entry.kind == KIND_DIR {
            fs::create_dir_all(target)?;
        }
    }
    for (entry, target) in entries.iter().zip(&resolved) {
        if entry.kind != KIND_FILE {
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, &entry.data)?;
        set_mode(target, entry.mode)?;
    }
    // Deepest directories first, in case a parent mode drops write access.
    let mut dirs: Vec<_> = entries
        .iter()
        .zip(&resolved)
        .filter(|(e, _)| e.kind == KIND_DIR)
        .collect();
    dirs.sort_by_key(|(_, t)| std::cmp::Reverse(t.components().count()));
    for (entry, target) in dirs {
        set_mode(target, entry.mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), EncDirError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), EncDirError> {
    Ok(())
}

/// Resolve an entry path strictly inside `dest`.
fn entry_target(dest: &Path, rel: &str) -> Result<PathBuf, EncDirError> {
    if rel.is_empty() {
        return Err(EncDirError::BadArchive);
    }
    let mut target = dest.to_path_buf();
    let mut depth = 0usize;
    for comp in Path::new(rel).components() {
        match comp {
            Component::Normal(c) => {
                target.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            // ParentDir, RootDir, or a windows Prefix would escape dest.
            _ => return Err(EncDirError::PathEscape),
        }
    }
    if depth == 0 {
        // Path collapsed to the root ("." and friends).
        return Err(EncDirError::BadArchive);
    }
    Ok(target)
}

pub(crate) fn encode_entries(entries: &[ArchiveEntry]) -> Result<Vec<u8>, EncDirError> {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    ciborium::ser::into_writer(&entries, &mut gz).map_err(|e| match e {
        ciborium::ser::Error::Io(io) => EncDirError::Io(io),
        _ => EncDirError::BadArchive,
    })?;
    Ok(gz.finish()?)
}

fn decode_entries(archive: &[u8]) -> Result<Vec<ArchiveEntry>, EncDirError> {
    // Any failure here (bad gzip stream, bad CBOR) means the payload is not
    // an archive we wrote.
    ciborium::de::from_reader(GzDecoder::new(archive)).map_err(|_| EncDirError::BadArchive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::tempdir;

    fn entry(path: &str, kind: u8, mode: u32, data: &[u8]) -> ArchiveEntry {
        ArchiveEntry {
            path: path.to_string(),
            kind,
            mode,
            data: data.to_vec(),
        }
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let src = tempdir().unwrap();
        fs::create_dir(src.path().join("sub")).unwrap();
        fs::File::create(src.path().join("a.txt"))
            .unwrap()
            .write_all(b"hello")
            .unwrap();
        fs::File::create(src.path().join("sub/b.bin"))
            .unwrap()
            .write_all(&[0u8, 1, 2, 255])
            .unwrap();

        let archive = pack(src.path()).unwrap();
        let dest = tempdir().unwrap();
        unpack(&archive, dest.path()).unwrap();

        assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"hello");
        assert_eq!(
            fs::read(dest.path().join("sub/b.bin")).unwrap(),
            vec![0u8, 1, 2, 255]
        );
        assert!(dest.path().join("sub").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn modes_survive_roundtrip() {
        use std::os::unix::fs::PermissionsExt;

        let src = tempdir().unwrap();
        let script = src.path().join("run.sh");
        fs::File::create(&script).unwrap().write_all(b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o700)).unwrap();

        let archive = pack(src.path()).unwrap();
        let dest = tempdir().unwrap();
        unpack(&archive, dest.path()).unwrap();

        let mode = fs::metadata(dest.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o700);
    }

    #[test]
    fn empty_directory_packs_to_empty_archive() {
        let src = tempdir().unwrap();
        let archive = pack(src.path()).unwrap();
        let dest = tempdir().unwrap();
        unpack(&archive, dest.path()).unwrap();
        assert!(dest.path().is_dir());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let archive =
            encode_entries(&[entry("../evil.txt", KIND_FILE, 0o644, b"x")]).unwrap();
        let dest = tempdir().unwrap();
        assert!(matches!(
            unpack(&archive, dest.path().join("inner").as_path()),
            Err(EncDirError::PathEscape)
        ));
        assert!(!dest.path().join("evil.txt").exists());
    }

    #[test]
    fn rejects_nested_escape_and_writes_nothing() {
        let archive = encode_entries(&[
            entry("ok.txt", KIND_FILE, 0o644, b"fine"),
            entry("a/../../evil.txt", KIND_FILE, 0o644, b"x"),
        ])
        .unwrap();
        let dest = tempdir().unwrap();
        assert!(matches!(
            unpack(&archive, dest.path()),
            Err(EncDirError::PathEscape)
        ));
        // Validation happens before any write, so even the benign entry is absent.
        assert!(!dest.path().join("ok.txt").exists());
    }

    #[test]
    fn rejects_absolute_path() {
        let archive = encode_entries(&[entry("/etc/evil", KIND_FILE, 0o644, b"x")]).unwrap();
        let dest = tempdir().unwrap();
        assert!(matches!(
            unpack(&archive, dest.path()),
            Err(EncDirError::PathEscape)
        ));
    }

    #[test]
    fn rejects_empty_and_root_paths() {
        for bad in ["", "."] {
            let archive = encode_entries(&[entry(bad, KIND_FILE, 0o644, b"x")]).unwrap();
            let dest = tempdir().unwrap();
            assert!(matches!(
                unpack(&archive, dest.path()),
                Err(EncDirError::BadArchive)
            ));
        }
    }

    #[test]
    fn unknown_entry_kind_is_skipped() {
        let archive = encode_entries(&[
            entry("keep.txt", KIND_FILE, 0o644, b"kept"),
            entry("mystery", 42, 0o644, b"ignored"),
        ])
        .unwrap();
        let dest = tempdir().unwrap();
        unpack(&archive, dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("keep.txt")).unwrap(), b"kept");
        assert!(!dest.path().join("mystery").exists());
    }

    #[test]
    fn garbage_is_bad_archive() {
        let dest = tempdir().unwrap();
        assert!(matches!(
            unpack(b"not an archive", dest.path()),
            Err(EncDirError::BadArchive)
        ));
    }
}
