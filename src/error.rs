//! Error types for the custom field installer.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, manifest loading, and field-set store access.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the custom field installer.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Manifest loading errors.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Field-set store errors.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Installer configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },
}

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file does not exist or is not a file.
    #[error("Manifest file \"{}\" not found", .path.display())]
    NotFound {
        /// Path to the missing manifest.
        path: PathBuf,
    },

    /// The manifest is not well-formed or does not follow the manifest layout.
    #[error("Failed to parse manifest: {message}{}", at_location(.location.as_deref()))]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Source location (`file:row:col` or `row:col`), if known.
        location: Option<String>,
    },

    /// The manifest parsed but its content is inconsistent.
    #[error("Invalid manifest: {message} ({field})")]
    Invalid {
        /// Description of the problem.
        message: String,
        /// Path of the offending element.
        field: String,
    },
}

/// Field-set store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A store operation could not be completed.
    #[error("Store operation failed: {message}")]
    OperationFailed {
        /// Description of the failure.
        message: String,
    },

    /// A write would break a store constraint.
    #[error("Store constraint violated: {message}")]
    ConstraintViolation {
        /// Description of the violated constraint.
        message: String,
    },

    /// Persisted store data is unreadable.
    #[error("Store data is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Store data could not be serialized.
    #[error("Store serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },
}

/// Formats an optional source location as a message suffix.
fn at_location(location: Option<&str>) -> String {
    location.map(|l| format!(" (at {l})")).unwrap_or_default()
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Returns true if the error means the manifest file is missing.
    #[must_use]
    pub const fn is_manifest_not_found(&self) -> bool {
        matches!(self, Self::Manifest(ManifestError::NotFound { .. }))
    }
}

impl ManifestError {
    /// Creates a parse error with an optional location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }

    /// Creates a validation error for a specific element path.
    #[must_use]
    pub fn invalid(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            field: field.into(),
        }
    }
}

impl StoreError {
    /// Creates an operation failure with the given message.
    #[must_use]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
        }
    }

    /// Creates a constraint violation with the given message.
    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}
