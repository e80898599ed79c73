// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Custom Field Installer
//!
//! Installs and uninstalls custom field sets declared in a manifest file.
//!
//! ## Overview
//!
//! A manifest declares named field sets, each a group of typed custom fields
//! attached to shop entities. The installer keeps a field-set store in line
//! with the manifest:
//!
//! - **install** deletes every declared set that is already stored and
//!   creates it again from the manifest
//! - **uninstall** deletes every declared set that is stored and skips the rest
//! - **status** reports which declared sets are missing, drifted or in sync
//!
//! Sets are matched by name only. Running either operation twice leaves the
//! store in the same state as running it once.
//!
//! ## Modules
//!
//! - [`manifest`]: Manifest parsing, validation and fingerprints
//! - [`store`]: Field-set store interface and backends
//! - [`context`]: Execution context flags passed to every store call
//! - [`reconciler`]: Install, uninstall and drift checks
//! - [`config`]: Installer settings
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```xml
//! <manifest>
//!   <custom-fields>
//!     <custom-field-set>
//!       <name>customer_loyalty</name>
//!       <related-entities><customer/></related-entities>
//!       <fields>
//!         <int name="points"><label>Points</label></int>
//!         <text name="tier"><label>Tier</label></text>
//!       </fields>
//!     </custom-field-set>
//!   </custom-fields>
//! </manifest>
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod reconciler;
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, InstallerConfig};
pub use context::{ExecutionContext, Indexing, Scope};
pub use error::{InstallerError, Result};
pub use manifest::{
    DefinitionHasher, FieldSetDefinition, FieldSpec, FieldType, Manifest, ManifestLoader,
    XmlManifestLoader,
};
pub use reconciler::{DriftReport, FieldSetReconciler, ReconciliationResult};
pub use store::{FieldSetStore, LocalFieldSetStore, MemoryFieldSetStore, StoredFieldSet};
