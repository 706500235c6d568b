//! Scope guard that removes a half-populated install directory.
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Owns a freshly created destination directory until [`commit`](Self::commit).
///
/// If the guard is dropped uncommitted (early return, panic unwinding) the
/// directory is removed. [`rollback`](Self::rollback) does the same eagerly
/// and reports whether the removal worked.
pub struct RollbackGuard<'a> {
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
    path: PathBuf,
    armed: bool,
}

impl std::fmt::Debug for RollbackGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackGuard")
            .field("path", &self.path)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

impl<'a> RollbackGuard<'a> {
    /// Guard `path`, which the caller has just created.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystemOps, log: &'a dyn Log, path: &Path) -> Self {
        Self {
            fs,
            log,
            path: path.to_path_buf(),
            armed: true,
        }
    }

    /// Keep the directory.
    pub fn commit(mut self) {
        self.armed = false;
    }

    /// Remove the directory now and return the error to surface.
    ///
    /// A failed removal is attempted once; the result wraps `cause` in
    /// [`InstallError::RollbackFailed`].
    #[must_use]
    pub fn rollback(mut self, cause: InstallError) -> InstallError {
        self.armed = false;
        self.log.warn(&format!("rolling back {}", self.path.display()));
        match self.remove() {
            Ok(()) => cause,
            Err(source) => InstallError::RollbackFailed {
                path: self.path.clone(),
                source,
                cause: Box::new(cause),
            },
        }
    }

    fn remove(&self) -> std::io::Result<()> {
        if self.fs.exists(&self.path) {
            self.fs.remove_dir_all(&self.path)
        } else {
            Ok(())
        }
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = self.remove()
        {
            self.log.error(&format!(
                "failed to remove partial install {}: {e}",
                self.path.display()
            ));
        }
    }
}
