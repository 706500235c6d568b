//! Command: print version information.

/// Version string embedded at build time, or the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DEPLOY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the deploy version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("deploy {}", version());
}
