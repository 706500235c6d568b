//! Filesystem operation abstractions for dependency injection.
//!
//! The install transaction performs every mutation through
//! [`FileSystemOps`] so that tests can inject failures (a full disk halfway
//! through the asset tree) without needing a real full disk. Production code
//! uses [`SystemFileSystemOps`].

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem calls made while resolving and installing.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;

    /// Returns the immediate child paths inside `path`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Create exactly one directory; the parent must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or its parent is missing.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Copy a single file, overwriting `to` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if reading `from` or writing `to` fails.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Remove a directory and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}

/// Recursively copy the directory tree at `src` into `dst` (which must not
/// exist yet).
///
/// Symlinks inside the source are followed, so the install contains real
/// files. On error, returns the path pair that failed alongside the I/O
/// error; whatever was already copied is left for the caller to roll back.
///
/// # Errors
///
/// Returns `(from, to, error)` for the first entry that could not be created
/// or copied.
pub fn copy_tree(
    fs: &dyn FileSystemOps,
    src: &Path,
    dst: &Path,
) -> Result<u64, (PathBuf, PathBuf, io::Error)> {
    fs.create_dir(dst)
        .map_err(|e| (src.to_path_buf(), dst.to_path_buf(), e))?;
    let entries = fs
        .read_dir(src)
        .map_err(|e| (src.to_path_buf(), dst.to_path_buf(), e))?;

    let mut files = 0;
    for src_path in entries {
        let Some(name) = src_path.file_name() else {
            continue;
        };
        let dst_path = dst.join(name);
        if fs.is_dir(&src_path) {
            files += copy_tree(fs, &src_path, &dst_path)?;
        } else {
            fs.copy_file(&src_path, &dst_path)
                .map_err(|e| (src_path.clone(), dst_path.clone(), e))?;
            files += 1;
        }
    }
    Ok(files)
}
