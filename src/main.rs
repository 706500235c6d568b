//! `deploy` binary: parse arguments, set up logging, dispatch a subcommand.
use std::process::ExitCode;

use clap::Parser;

use deploy_cli::cli::{Cli, Command};
use deploy_cli::error::{display_chain, exit_code_for};
use deploy_cli::{commands, logging};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Build);

    logging::init_subscriber(args.verbose, command.name());
    let log = logging::Logger::new(command.name());
    log.debug(&format!("deploy {}", commands::version::version()));

    let result = match &command {
        Command::Build => commands::build::run(&args.global, &log),
        Command::Run => commands::run::run(&args.global, &log),
        Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&display_chain(&e));
            ExitCode::from(exit_code_for(&e))
        }
    }
}
