//! Command: build, then launch the built executable.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::install::Deny;
use crate::logging::Logger;
use crate::orchestrator::{Mode, Options};

/// Run the run command.
///
/// # Errors
///
/// Returns an error if setup or the build fails, or the executable exits
/// non-zero.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let options = Options::new(Mode::BuildAndRun, setup.root.clone());
    setup.run_pipeline(&options, &Deny, log)
}
