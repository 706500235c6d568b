//! Build-and-deploy orchestrator for a CMake desktop application.
//!
//! Drives CMake through configure and build, then either launches the
//! freshly built executable or packages it, its shared libraries and its
//! asset tree into a self-contained `<target>/<app name>` directory.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: `deploy.toml` schema and the per-platform artifact tables
//! - **[`builder`]**: configure-then-build driver ([`builder::BuildInvoker`])
//! - **[`resolver`]**: artifact table to verified [`resolver::InstallPlan`]
//! - **[`install`]**: all-or-nothing copy with rollback
//! - **[`orchestrator`]**: sequences the above for each [`orchestrator::Mode`]
//! - **[`commands`]**: subcommand entry points wired to production collaborators
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod builder;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod install;
pub mod logging;
pub mod operations;
pub mod orchestrator;
pub mod platform;
pub mod resolver;
