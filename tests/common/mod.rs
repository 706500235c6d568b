// Shared helpers for integration tests.
//
// Provides a temporary project (source root with an asset tree), a fake
// CMake that "produces" build output on the build step, a filesystem that
// runs out of space after N copies, and a Log implementation that records
// what was logged.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use deploy_cli::config::DeployConfig;
use deploy_cli::exec::{ExecResult, Executor};
use deploy_cli::logging::{Log, StepStatus};
use deploy_cli::operations::{FileSystemOps, SystemFileSystemOps};

/// App name used by every fixture.
pub const APP: &str = "Chess";

/// Asset files written by [`ProjectFixture::new`], relative to `assets/`.
pub const ASSET_FILES: &[&str] = &["board.png", "pieces/king.png", "sounds/move.wav"];

/// An isolated project source tree backed by a [`tempfile::TempDir`].
pub struct ProjectFixture {
    /// Project root (stands in for the directory holding `CMakeLists.txt`).
    pub root: tempfile::TempDir,
    /// Configuration the pipeline runs with.
    pub config: DeployConfig,
}

impl ProjectFixture {
    /// Create a project with an asset tree and an empty build directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for rel in ASSET_FILES {
            let path = root.path().join("assets").join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("asset:{rel}")).unwrap();
        }
        std::fs::create_dir_all(root.path().join("build")).unwrap();

        let mut config = DeployConfig::default();
        config.project.app_name = APP.to_string();
        Self { root, config }
    }

    /// Path to the project root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root.path().join("build")
    }

    /// Write a file into the build output directory.
    pub fn with_build_file(self, rel: &str) -> Self {
        write_file(&self.build_dir().join(rel), rel.as_bytes());
        self
    }

    /// Write a file anywhere under the project root.
    pub fn with_project_file(self, rel: &str) -> Self {
        write_file(&self.root.path().join(rel), rel.as_bytes());
        self
    }
}

fn write_file(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Recursively list every file under `dir` with its contents, sorted.
///
/// Used to compare directory trees byte for byte.
pub fn snapshot_tree(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_path_buf();
                out.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// A stand-in for CMake.
///
/// The configure step does nothing; the build step writes `outputs` into the
/// build directory it runs in. Exit codes are consumed in order per call and
/// default to 0. Any other program (the built executable) exits with
/// `run_exit`.
#[derive(Debug, Default)]
pub struct FakeCMake {
    outputs: Vec<String>,
    exit_codes: Mutex<Vec<i32>>,
    run_exit: i32,
    calls: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
}

impl FakeCMake {
    /// A build that produces `outputs` (paths relative to the build dir).
    pub fn producing(outputs: &[&str]) -> Self {
        Self {
            outputs: outputs.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Script exit codes for successive calls.
    pub fn with_exit_codes(self, codes: &[i32]) -> Self {
        *self.exit_codes.lock().unwrap() = codes.iter().rev().copied().collect();
        self
    }

    /// Exit code of the launched application.
    pub fn with_run_exit(mut self, code: i32) -> Self {
        self.run_exit = code;
        self
    }

    /// `(dir, program, args)` of every call so far.
    pub fn calls(&self) -> Vec<(PathBuf, String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for FakeCMake {
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> anyhow::Result<ExecResult> {
        self.calls
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), program.to_string(), args.to_vec()));
        let code = if program == "cmake" {
            let code = self.exit_codes.lock().unwrap().pop().unwrap_or(0);
            if code == 0 && args.first().is_some_and(|a| a == "--build") {
                for rel in &self.outputs {
                    write_file(&dir.join(rel), format!("built:{rel}").as_bytes());
                }
            }
            code
        } else {
            self.run_exit
        };
        Ok(ExecResult {
            success: code == 0,
            code: Some(code),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/usr/bin").join(program))
    }
}

/// Real filesystem whose copies fail with `StorageFull` after `allowed`
/// successful copies.
#[derive(Debug)]
pub struct DiskFull {
    allowed: usize,
    copies: AtomicUsize,
}

impl DiskFull {
    /// Allow `allowed` copies to succeed.
    pub const fn after(allowed: usize) -> Self {
        Self {
            allowed,
            copies: AtomicUsize::new(0),
        }
    }
}

impl FileSystemOps for DiskFull {
    fn exists(&self, path: &Path) -> bool {
        SystemFileSystemOps.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        SystemFileSystemOps.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        SystemFileSystemOps.is_file(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        SystemFileSystemOps.read_dir(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        SystemFileSystemOps.create_dir(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        if self.copies.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(io::Error::new(
                io::ErrorKind::StorageFull,
                "no space left on device",
            ));
        }
        SystemFileSystemOps.copy_file(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        SystemFileSystemOps.remove_dir_all(path)
    }
}

/// [`Log`] implementation that keeps every message and step in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<(&'static str, String)>>,
    steps: Mutex<Vec<(String, StepStatus)>>,
}

impl RecordingLog {
    fn push(&self, level: &'static str, msg: &str) {
        self.messages.lock().unwrap().push((level, msg.to_string()));
    }

    /// Messages logged at `level` (`"warn"`, `"info"`, ...).
    pub fn at(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Recorded pipeline steps.
    pub fn steps(&self) -> Vec<(String, StepStatus)> {
        self.steps.lock().unwrap().clone()
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }

    fn info(&self, msg: &str) {
        self.push("info", msg);
    }

    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }

    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }

    fn error(&self, msg: &str) {
        self.push("error", msg);
    }

    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }

    fn record_step(&self, name: &str, status: StepStatus, _message: Option<&str>) {
        self.steps.lock().unwrap().push((name.to_string(), status));
    }
}
