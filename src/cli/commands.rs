//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Installs and uninstalls custom field sets declared in a manifest.
#[derive(Parser, Debug)]
#[command(name = "custom-fields")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the installer configuration file.
    #[arg(short, long, global = true, env = "CUSTOM_FIELDS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of the field-set store (overrides the configuration and
    /// `CUSTOM_FIELDS_STORE_DIR`). Relative paths resolve against the
    /// current directory.
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install custom fields.
    Install {
        /// Manifest file (XML).
        manifest: PathBuf,
    },

    /// Uninstall custom fields.
    Uninstall {
        /// Manifest file (XML).
        manifest: PathBuf,
    },

    /// Compare the manifest with the stored custom fields.
    Status {
        /// Manifest file (XML).
        manifest: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Commands {
    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
            Self::Uninstall { .. } => "uninstall",
            Self::Status { .. } => "status",
        }
    }

    /// Returns the one-line command description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Install { .. } => "Install custom fields",
            Self::Uninstall { .. } => "Uninstall custom fields",
            Self::Status { .. } => "Custom field status",
        }
    }

    /// Returns the manifest path argument.
    #[must_use]
    pub const fn manifest(&self) -> &PathBuf {
        match self {
            Self::Install { manifest } | Self::Uninstall { manifest } | Self::Status { manifest } => {
                manifest
            }
        }
    }
}
