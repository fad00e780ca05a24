//! Filesystem helpers for owner-only files
//!
//! History, key, and config files hold private data, so they are created
//! with restrictive permissions on Unix before any content is written.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unix file permissions for private files (owner read/write only)
#[cfg(unix)]
pub const FILE_PERMISSIONS: u32 = 0o600;

/// Unix directory permissions for private directories
#[cfg(unix)]
pub const DIR_PERMISSIONS: u32 = 0o700;

/// Create `dir` (and parents) if missing, restricting it to the owner on Unix
pub fn create_private_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(dir, fs::Permissions::from_mode(DIR_PERMISSIONS));
    }

    Ok(())
}

/// Create the parent directory of `path` if it has one
pub fn create_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => create_private_dir(parent),
        None => Ok(()),
    }
}

/// Open `path` for writing with owner-only permissions
///
/// With `create_new`, fails with `AlreadyExists` instead of truncating.
pub fn open_private(path: &Path, create_new: bool) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_PERMISSIONS);
    }

    options.open(path)
}

/// Replace the contents of `path` without ever exposing a partial file
///
/// Writes to a sibling temporary file, syncs it, then renames it over `path`.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    create_parent_dir(path)?;

    let temp_path = temp_path_for(path);
    let result = (|| -> io::Result<()> {
        let mut file = open_private(&temp_path, false)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Create `path` holding `contents`, failing with `AlreadyExists` if present
///
/// Readers never see a partial file: contents are synced to a sibling
/// temporary file which is then hard-linked into place. Linking does not
/// replace an existing target, so exactly one concurrent creator wins.
pub fn publish_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    create_parent_dir(path)?;

    let temp_path = temp_path_for(path);
    let result = (|| -> io::Result<()> {
        let mut file = open_private(&temp_path, false)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::hard_link(&temp_path, path)
    })();

    let _ = fs::remove_file(&temp_path);
    result
}

/// Sibling path used while a file is being written
///
/// Unique per process and call, so concurrent writers never share one.
fn temp_path_for(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_private_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");

        write_private(&path, b"first").unwrap();
        write_private(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_private_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("data.bin");

        write_private(&path, b"nested").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"nested");
    }

    #[test]
    fn test_temp_path_is_unique_sibling() {
        let path = Path::new("/tmp/store/history.enc");
        let first = temp_path_for(path);
        let second = temp_path_for(path);

        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(Path::new("/tmp/store")));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("history.enc."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_publish_private_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("once");

        publish_private(&path, b"first").unwrap();
        let err = publish_private(&path, b"second").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).unwrap(), b"first");
        // Temporary file is cleaned up on both paths
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_private_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.key");
        publish_private(&path, b"key").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, FILE_PERMISSIONS);
    }

    #[test]
    fn test_open_private_create_new_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("once");

        open_private(&path, true).unwrap();
        let err = open_private(&path, true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret");
        write_private(&path, b"x").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, FILE_PERMISSIONS);
    }
}
