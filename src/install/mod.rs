//! All-or-nothing installation of a resolved [`InstallPlan`].
//!
//! The destination `<root>/<app>` either ends up holding every planned file
//! plus the asset tree, or does not exist once [`InstallTransaction::install`]
//! returns an error. The root itself is never created.
pub mod confirm;
mod guard;

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::logging::Log;
use crate::operations::{FileSystemOps, copy_tree};
use crate::resolver::InstallPlan;

pub use confirm::{AssumeYes, Confirm, Deny, InquirePrompt, select_policy};
pub use guard::RollbackGuard;

/// Subdirectory of the install that receives the asset tree.
pub const ASSETS_SUBDIR: &str = "assets";

/// Where an install goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// Existing parent directory.
    pub root_path: PathBuf,
    /// Product name; the install directory is `root_path/app_name`.
    pub app_name: String,
}

impl InstallTarget {
    /// Create a target.
    #[must_use]
    pub fn new(root_path: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            app_name: app_name.into(),
        }
    }

    /// The install directory.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.root_path.join(&self.app_name)
    }
}

/// Copies an [`InstallPlan`] into an [`InstallTarget`].
pub struct InstallTransaction<'a> {
    fs: &'a dyn FileSystemOps,
    confirm: &'a dyn Confirm,
    log: &'a dyn Log,
    dry_run: bool,
}

impl std::fmt::Debug for InstallTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallTransaction")
            .field("fs", &self.fs)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> InstallTransaction<'a> {
    /// Create a transaction that asks `confirm` before replacing an
    /// existing install.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystemOps, confirm: &'a dyn Confirm, log: &'a dyn Log) -> Self {
        Self {
            fs,
            confirm,
            log,
            dry_run: false,
        }
    }

    /// Log what would be removed and copied instead of doing it.
    ///
    /// Target checks and the overwrite question still happen.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Install `plan` into `target` and return the install directory.
    ///
    /// # Errors
    ///
    /// - [`InstallError::PathNotFound`] if `target.root_path` is not an
    ///   existing directory.
    /// - [`InstallError::OverwriteDeclined`] if the destination exists and
    ///   the confirmation policy says no; the destination is left untouched.
    /// - [`InstallError::Prepare`] if the old destination cannot be removed or
    ///   the new one cannot be created.
    /// - [`InstallError::CopyFailed`] if any copy fails; the destination has
    ///   been removed again (or [`InstallError::RollbackFailed`] if that
    ///   removal failed too).
    pub fn install(
        &self,
        plan: &InstallPlan,
        target: &InstallTarget,
    ) -> Result<PathBuf, InstallError> {
        if !self.fs.is_dir(&target.root_path) {
            return Err(InstallError::PathNotFound(target.root_path.clone()));
        }

        let dest = target.destination();
        if self.fs.exists(&dest) {
            let question = format!("{} already exists. Overwrite?", dest.display());
            if !self.confirm.confirm(&question) {
                return Err(InstallError::OverwriteDeclined(dest));
            }
            if self.dry_run {
                self.log.dry_run(&format!("would remove {}", dest.display()));
            } else {
                self.log.debug(&format!("removing {}", dest.display()));
                self.fs
                    .remove_dir_all(&dest)
                    .map_err(|source| InstallError::Prepare {
                        path: dest.clone(),
                        source,
                    })?;
            }
        }

        if self.dry_run {
            self.preview(plan, &dest);
            return Ok(dest);
        }

        self.fs
            .create_dir(&dest)
            .map_err(|source| InstallError::Prepare {
                path: dest.clone(),
                source,
            })?;
        let guard = RollbackGuard::new(self.fs, self.log, &dest);

        match self.populate(plan, &dest) {
            Ok(copied) => {
                guard.commit();
                self.log
                    .info(&format!("installed {copied} files into {}", dest.display()));
                Ok(dest)
            }
            Err(e) => Err(guard.rollback(e)),
        }
    }

    /// Copy every planned file and the asset tree; returns the file count.
    fn populate(&self, plan: &InstallPlan, dest: &Path) -> Result<u64, InstallError> {
        for file in &plan.files {
            let to = dest.join(&file.dest_name);
            self.log.debug(&format!(
                "copy {} -> {}",
                file.source.display(),
                to.display()
            ));
            self.fs
                .copy_file(&file.source, &to)
                .map_err(|source| InstallError::CopyFailed {
                    artifact: file.dest_name.clone(),
                    from: file.source.clone(),
                    to,
                    source,
                })?;
        }

        let assets = dest.join(ASSETS_SUBDIR);
        self.log.debug(&format!(
            "copy tree {} -> {}",
            plan.assets.display(),
            assets.display()
        ));
        let asset_files = copy_tree(self.fs, &plan.assets, &assets).map_err(
            |(from, to, source)| InstallError::CopyFailed {
                artifact: ASSETS_SUBDIR.to_string(),
                from,
                to,
                source,
            },
        )?;

        Ok(plan.files.len() as u64 + asset_files)
    }

    fn preview(&self, plan: &InstallPlan, dest: &Path) {
        self.log.dry_run(&format!("would create {}", dest.display()));
        for file in &plan.files {
            self.log.dry_run(&format!(
                "would copy {} -> {}",
                file.source.display(),
                dest.join(&file.dest_name).display()
            ));
        }
        self.log.dry_run(&format!(
            "would copy tree {} -> {}",
            plan.assets.display(),
            dest.join(ASSETS_SUBDIR).display()
        ));
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::confirm::MockConfirm;
    use super::*;
    use crate::config::ArtifactKind;
    use crate::logging::isolated_logger;
    use crate::operations::SystemFileSystemOps;
    use crate::operations::test_helpers::DiskFullAfter;
    use crate::resolver::ResolvedArtifact;
    use std::fs;

    /// Build output with one executable and a two-file asset tree.
    fn fixture() -> (tempfile::TempDir, InstallPlan) {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("Game"), b"binary").unwrap();
        fs::create_dir_all(src.path().join("assets/sounds")).unwrap();
        fs::write(src.path().join("assets/board.png"), b"board").unwrap();
        fs::write(src.path().join("assets/sounds/move.wav"), b"move").unwrap();
        let plan = InstallPlan {
            files: vec![ResolvedArtifact {
                source: src.path().join("Game"),
                dest_name: "Game".to_string(),
                required: true,
                kind: ArtifactKind::Executable,
            }],
            assets: src.path().join("assets"),
            warnings: Vec::new(),
        };
        (src, plan)
    }

    fn never_asked() -> MockConfirm {
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().never();
        confirm
    }

    #[test]
    fn fresh_install_populates_destination() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        let confirm = never_asked();

        let dest = InstallTransaction::new(&SystemFileSystemOps, &confirm, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap();

        assert_eq!(dest, root.path().join("Game"));
        assert_eq!(fs::read(dest.join("Game")).unwrap(), b"binary");
        assert_eq!(fs::read(dest.join("assets/board.png")).unwrap(), b"board");
        assert_eq!(
            fs::read(dest.join("assets/sounds/move.wav")).unwrap(),
            b"move"
        );
    }

    #[test]
    fn missing_root_is_not_created() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("typo").join("deeper");
        let confirm = never_asked();

        let err = InstallTransaction::new(&SystemFileSystemOps, &confirm, &log)
            .install(&plan, &InstallTarget::new(&missing, "Game"))
            .unwrap_err();

        assert!(matches!(err, InstallError::PathNotFound(p) if p == missing));
        assert!(!root.path().join("typo").exists());
    }

    #[test]
    fn declined_overwrite_leaves_existing_install() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Game")).unwrap();
        fs::write(root.path().join("Game/old.txt"), b"keep me").unwrap();

        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .withf(|q| q.contains("already exists"))
            .times(1)
            .return_const(false);

        let err = InstallTransaction::new(&SystemFileSystemOps, &confirm, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap_err();

        assert!(matches!(err, InstallError::OverwriteDeclined(_)));
        assert_eq!(
            fs::read(root.path().join("Game/old.txt")).unwrap(),
            b"keep me"
        );
        assert!(!root.path().join("Game/Game").exists());
    }

    #[test]
    fn confirmed_overwrite_replaces_old_contents() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Game")).unwrap();
        fs::write(root.path().join("Game/stale.dll"), b"old").unwrap();

        let dest = InstallTransaction::new(&SystemFileSystemOps, &AssumeYes, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap();

        assert!(!dest.join("stale.dll").exists());
        assert!(dest.join("Game").exists());
    }

    #[test]
    fn failed_file_copy_rolls_back() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        let fs_ops = DiskFullAfter::new(0);

        let err = InstallTransaction::new(&fs_ops, &Deny, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap_err();

        assert!(matches!(&err, InstallError::CopyFailed { artifact, .. } if artifact == "Game"));
        assert!(!root.path().join("Game").exists());
    }

    #[test]
    fn failed_asset_copy_rolls_back() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        // Executable and first asset succeed, second asset hits a full disk.
        let fs_ops = DiskFullAfter::new(2);

        let err = InstallTransaction::new(&fs_ops, &Deny, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap_err();

        assert!(
            matches!(&err, InstallError::CopyFailed { artifact, .. } if artifact == ASSETS_SUBDIR)
        );
        assert!(!root.path().join("Game").exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_rollback_is_reported_with_cause() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        let fs_ops = DiskFullAfter::new(1).with_failing_remove();

        let err = InstallTransaction::new(&fs_ops, &Deny, &log)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap_err();

        match err {
            InstallError::RollbackFailed { cause, .. } => {
                assert!(matches!(*cause, InstallError::CopyFailed { .. }));
            }
            other => panic!("expected RollbackFailed, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_touches_nothing() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Game")).unwrap();
        fs::write(root.path().join("Game/old.txt"), b"keep me").unwrap();

        let dest = InstallTransaction::new(&SystemFileSystemOps, &AssumeYes, &log)
            .dry_run(true)
            .install(&plan, &InstallTarget::new(root.path(), "Game"))
            .unwrap();

        assert_eq!(fs::read(dest.join("old.txt")).unwrap(), b"keep me");
        assert!(!dest.join("Game").exists());
    }

    #[test]
    fn repeated_install_is_idempotent() {
        let (log, _tmp, _guard) = isolated_logger();
        let (_src, plan) = fixture();
        let root = tempfile::tempdir().unwrap();
        let target = InstallTarget::new(root.path(), "Game");
        let tx = InstallTransaction::new(&SystemFileSystemOps, &AssumeYes, &log);

        let dest = tx.install(&plan, &target).unwrap();
        let first = fs::read(dest.join("assets/sounds/move.wav")).unwrap();
        tx.install(&plan, &target).unwrap();
        let second = fs::read(dest.join("assets/sounds/move.wav")).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 2);
    }
}
