//! Target platform detection.
use std::fmt;
use std::str::FromStr;

/// Platform family that decides the artifact layout of an install.
///
/// Windows builds ship their shared libraries next to the executable; every
/// other system is treated as POSIX, where the executable is installed alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Microsoft Windows (DLL-bearing layout, `.exe` suffix).
    Windows,
    /// Linux, macOS and other Unix-like systems.
    Posix,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Posix => write!(f, "posix"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "posix" | "linux" | "unix" | "macos" => Ok(Self::Posix),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

impl Platform {
    /// Detect the platform this binary was compiled for.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Whether this is the Windows layout.
    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// File name of the application executable on this platform.
    #[must_use]
    pub fn executable_name(self, app_name: &str) -> String {
        match self {
            Self::Windows => format!("{app_name}.exe"),
            Self::Posix => app_name.to_string(),
        }
    }

    /// CMake generator to request explicitly, if any.
    ///
    /// Only Windows needs one: without it CMake picks Visual Studio, whose
    /// output layout the MinGW-built dependencies do not match.
    #[must_use]
    pub fn generator<'a>(self, windows_generator: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::Windows => windows_generator,
            Self::Posix => None,
        }
    }
}
