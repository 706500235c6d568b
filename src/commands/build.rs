//! Command: configure and build only.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::install::Deny;
use crate::logging::Logger;
use crate::orchestrator::{Mode, Options};

/// Run the build command.
///
/// # Errors
///
/// Returns an error if setup fails or the build tool reports failure.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let options = Options::new(Mode::BuildOnly, setup.root.clone());
    setup.run_pipeline(&options, &Deny, log)
}
