//! Per-platform artifact tables.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::platform::Platform;

/// Role of an artifact in the install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// The application executable; exactly one per platform.
    Executable,
    /// A shared library shipped next to the executable.
    #[default]
    Library,
}

/// One file the build must produce for an install.
///
/// ```toml
/// [[artifacts.windows]]
/// source = "Game.exe"
/// fallbacks = ["Release/Game.exe"]
/// kind = "executable"
/// required = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// Path relative to the build output directory.
    pub source: PathBuf,
    /// Further relative locations to try, in order, when `source` is absent
    /// (multi-config generators put binaries in a `Release/` subdirectory).
    #[serde(default)]
    pub fallbacks: Vec<PathBuf>,
    /// File name inside the install directory; defaults to the source file name.
    #[serde(default)]
    pub dest: Option<String>,
    /// Missing required artifacts abort the install; missing optional ones
    /// only warn.
    #[serde(default)]
    pub required: bool,
    /// Artifact role.
    #[serde(default)]
    pub kind: ArtifactKind,
}

impl ArtifactSpec {
    /// A required executable at `source`.
    #[must_use]
    pub fn executable(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            fallbacks: Vec::new(),
            dest: None,
            required: true,
            kind: ArtifactKind::Executable,
        }
    }

    /// An optional shared library at `source`.
    #[must_use]
    pub fn optional_library(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            fallbacks: Vec::new(),
            dest: None,
            required: false,
            kind: ArtifactKind::Library,
        }
    }

    /// Add a fallback location.
    #[must_use]
    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallbacks.push(path.into());
        self
    }

    /// File name inside the install directory.
    #[must_use]
    pub fn dest_name(&self) -> String {
        self.dest.clone().unwrap_or_else(|| {
            self.source.file_name().map_or_else(
                || self.source.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            )
        })
    }

    /// Every location to check under `build_dir`, primary first.
    #[must_use]
    pub fn candidates(&self, build_dir: &Path) -> Vec<PathBuf> {
        std::iter::once(&self.source)
            .chain(&self.fallbacks)
            .map(|rel| build_dir.join(rel))
            .collect()
    }
}

/// Shared libraries the Windows build loads at runtime.
///
/// Any of these may be statically linked in a given build configuration,
/// so they are all optional.
pub const WINDOWS_RUNTIME_LIBRARIES: &[&str] = &[
    "sfml-audio-2.dll",
    "sfml-graphics-2.dll",
    "sfml-window-2.dll",
    "sfml-system-2.dll",
    "openal32.dll",
];

/// Built-in artifact table for `platform`.
#[must_use]
pub fn default_artifacts(platform: Platform, app_name: &str) -> Vec<ArtifactSpec> {
    let exe = platform.executable_name(app_name);
    match platform {
        Platform::Windows => {
            let mut specs =
                vec![ArtifactSpec::executable(&exe).with_fallback(Path::new("Release").join(&exe))];
            specs.extend(
                WINDOWS_RUNTIME_LIBRARIES
                    .iter()
                    .copied()
                    .map(ArtifactSpec::optional_library),
            );
            specs
        }
        Platform::Posix => vec![ArtifactSpec::executable(exe)],
    }
}

/// Built-in extra library directories (relative to the project root) for
/// `platform`.
#[must_use]
pub fn default_library_dirs(platform: Platform) -> Vec<PathBuf> {
    match platform {
        Platform::Windows => vec![PathBuf::from("external").join("RELEASE-DLL-Windows")],
        Platform::Posix => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn windows_defaults_have_one_required_executable() {
        let specs = default_artifacts(Platform::Windows, "Game");
        let required: Vec<_> = specs.iter().filter(|s| s.required).collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].kind, ArtifactKind::Executable);
        assert_eq!(required[0].dest_name(), "Game.exe");
    }

    #[test]
    fn windows_default_dest_names() {
        let names: Vec<String> = default_artifacts(Platform::Windows, "Tamerlane-Chess")
            .iter()
            .map(ArtifactSpec::dest_name)
            .collect();
        insta::assert_snapshot!(
            names.join(","),
            @"Tamerlane-Chess.exe,sfml-audio-2.dll,sfml-graphics-2.dll,sfml-window-2.dll,sfml-system-2.dll,openal32.dll"
        );
    }

    #[test]
    fn posix_defaults_are_executable_only() {
        let specs = default_artifacts(Platform::Posix, "Game");
        assert_eq!(specs, vec![ArtifactSpec::executable("Game")]);
    }

    #[test]
    fn candidates_put_primary_first() {
        let spec = ArtifactSpec::executable("Game.exe").with_fallback("Release/Game.exe");
        let build = Path::new("/b");
        assert_eq!(
            spec.candidates(build),
            vec![build.join("Game.exe"), build.join("Release/Game.exe")]
        );
    }

    #[test]
    fn explicit_dest_overrides_file_name() {
        let spec = ArtifactSpec {
            dest: Some("renamed.dll".to_string()),
            ..ArtifactSpec::optional_library("bin/libfoo.dll")
        };
        assert_eq!(spec.dest_name(), "renamed.dll");
        assert_eq!(
            ArtifactSpec::optional_library("bin/libfoo.dll").dest_name(),
            "libfoo.dll"
        );
    }

    #[test]
    fn deserialize_defaults_to_optional_library() {
        let spec: ArtifactSpec = toml::from_str("source = \"a.dll\"").unwrap();
        assert!(!spec.required);
        assert_eq!(spec.kind, ArtifactKind::Library);
    }
}
