//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the build-and-deploy tool.
#[derive(Parser, Debug)]
#[command(
    name = "deploy",
    about = "Build the application with CMake, then run or install it",
    version
)]
pub struct Cli {
    /// Action to perform; builds only when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Project root containing CMakeLists.txt (default: DEPLOY_ROOT or the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (default: <root>/deploy.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Preview install changes without applying them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Configure and build
    Build,
    /// Build, then launch the built executable
    Run,
    /// Build, then install into <PATH>/<app name>
    Install(InstallOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name, used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Run => "run",
            Self::Install(_) => "install",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Existing directory to install into (default: install.target_default)
    pub path: Option<PathBuf>,

    /// Answer yes to every confirmation: installing into the current
    /// directory when no PATH is given, and replacing an existing install
    #[arg(short, long, conflicts_with = "no_input")]
    pub yes: bool,

    /// Never prompt; confirmations are answered no
    #[arg(long)]
    pub no_input: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_build() {
        let cli = Cli::parse_from(["deploy"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["deploy", "run"]);
        assert!(matches!(cli.command, Some(Command::Run)));
    }

    #[test]
    fn parse_install_with_path() {
        let cli = Cli::parse_from(["deploy", "install", "/opt/games"]);
        let Some(Command::Install(opts)) = cli.command else {
            unreachable!("expected install");
        };
        assert_eq!(opts.path, Some(PathBuf::from("/opt/games")));
        assert!(!opts.yes);
    }

    #[test]
    fn parse_install_without_path() {
        let cli = Cli::parse_from(["deploy", "install", "--no-input"]);
        let Some(Command::Install(opts)) = cli.command else {
            unreachable!("expected install");
        };
        assert!(opts.path.is_none());
        assert!(opts.no_input);
    }

    #[test]
    fn yes_conflicts_with_no_input() {
        assert!(Cli::try_parse_from(["deploy", "install", "--yes", "--no-input"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["deploy", "install", "-d", "--root", "/src", "-v"]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.global.root, Some(PathBuf::from("/src")));
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["deploy", "--config", "ci.toml", "build"]);
        assert_eq!(cli.global.config, Some(PathBuf::from("ci.toml")));
        assert!(matches!(cli.command, Some(Command::Build)));
    }

    #[test]
    fn command_names() {
        assert_eq!(Command::Build.name(), "build");
        assert_eq!(
            Command::Install(InstallOpts {
                path: None,
                yes: false,
                no_input: false
            })
            .name(),
            "install"
        );
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["deploy", "version"]);
        assert!(matches!(cli.command, Some(Command::Version)));
    }
}
