//! Manifest module for the custom field installer.
//!
//! This module handles everything on the desired-state side:
//! - Parsing the `<custom-fields>` section of XML manifest files
//! - Validating set and field names
//! - Computing content fingerprints for drift checks

mod hash;
mod loader;
mod types;
mod validator;

pub use hash::DefinitionHasher;
pub use loader::{ManifestLoader, XmlManifestLoader};
pub use types::{
    CustomFieldsSection, DEFAULT_LOCALE, FieldSetDefinition, FieldSpec, FieldType, Manifest,
    Translations,
};
pub use validator::{ManifestValidator, ValidationError, ValidationResult};
