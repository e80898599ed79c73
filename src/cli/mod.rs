//! CLI module for the custom field installer.
//!
//! This module provides the command-line interface for installing and
//! uninstalling custom field sets.

mod commands;
mod output;
mod setup;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
pub use setup::{EXIT_FAILURE, EXIT_SUCCESS, check_manifest, exit_status, open_store, prepare};
