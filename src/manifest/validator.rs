//! Manifest validation.
//!
//! Checks the parts of a manifest the reconciler relies on: every field set
//! has a non-empty name that is unique within the manifest, and every field
//! name is non-empty and unique within its set.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{ManifestError, Result};

use super::types::{FieldSetDefinition, Manifest};

/// Validator for parsed manifests.
#[derive(Debug, Default)]
pub struct ManifestValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// Path of the element that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ManifestValidator {
    /// Creates a new manifest validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a manifest.
    ///
    /// Warnings are logged; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Invalid`] if any check fails.
    pub fn validate(&self, manifest: &Manifest) -> Result<ValidationResult> {
        let result = self.check(manifest);

        for warning in &result.warnings {
            warn!("{warning}");
        }

        if let Some(first) = result.errors.first() {
            return Err(ManifestError::invalid(first.message.clone(), first.field.clone()).into());
        }

        debug!("Manifest validation passed");
        Ok(result)
    }

    /// Runs every check and collects the findings.
    #[must_use]
    pub fn check(&self, manifest: &Manifest) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mut seen_names = HashSet::new();

        for (i, set) in manifest.field_sets().iter().enumerate() {
            let prefix = format!("custom-fields.custom-field-set[{i}]");

            if set.name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Custom field set name cannot be empty"),
                });
            } else if !seen_names.insert(set.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate custom field set name: {}", set.name),
                });
            }

            Self::check_fields(set, &prefix, &mut result);
        }

        result
    }

    /// Checks the fields of one set.
    fn check_fields(set: &FieldSetDefinition, prefix: &str, result: &mut ValidationResult) {
        if set.fields.is_empty() {
            result
                .warnings
                .push(format!("Custom field set '{}' declares no fields", set.name));
            return;
        }

        let mut seen = HashSet::new();
        for (j, field) in set.fields.iter().enumerate() {
            if field.name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.fields[{j}].name"),
                    message: String::from("Custom field name cannot be empty"),
                });
            } else if !seen.insert(field.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.fields[{j}].name"),
                    message: format!(
                        "Duplicate custom field name '{}' in set '{}'",
                        field.name, set.name
                    ),
                });
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
