//! Command: build, then install into a target directory.
use anyhow::Result;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::install::select_policy;
use crate::logging::Logger;
use crate::orchestrator::{Mode, Options};

/// Run the install command.
///
/// Overwrite and default-target questions go to an interactive prompt
/// unless `--yes`, `--no-input` or a non-terminal stdin decide them.
///
/// # Errors
///
/// Returns an error if setup, the build, plan resolution or the install
/// transaction fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let options = Options {
        mode: Mode::BuildAndInstall,
        install_root: opts.path.clone(),
        cwd: super::current_dir()?,
        dry_run: global.dry_run,
    };
    if options.dry_run {
        log.dry_run("install changes will be previewed only");
    }
    let confirm = select_policy(opts.yes, opts.no_input);
    setup.run_pipeline(&options, confirm.as_ref(), log)
}
