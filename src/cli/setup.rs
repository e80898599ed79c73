//! Command setup shared by every subcommand.
//!
//! Checks the manifest argument, opens the configured store, and maps
//! command results to process exit statuses.

use std::path::Path;
use tracing::{debug, info};

use crate::config::ConfigParser;
use crate::error::{ManifestError, Result};
use crate::store::{FieldSetStore, LocalFieldSetStore};

/// Exit status of a successful command.
pub const EXIT_SUCCESS: u8 = 0;

/// Exit status of a failed command.
pub const EXIT_FAILURE: u8 = 1;

/// Fails with [`ManifestError::NotFound`] if `manifest` does not exist.
///
/// # Errors
///
/// Returns an error naming the path when nothing exists there.
pub fn check_manifest(manifest: &Path) -> Result<()> {
    if manifest.exists() {
        return Ok(());
    }

    Err(ManifestError::NotFound {
        path: manifest.to_path_buf(),
    }
    .into())
}

/// Checks the manifest, then loads configuration and opens the store.
///
/// Nothing is read from configuration and no store is opened when the
/// manifest is missing.
///
/// # Errors
///
/// Returns the manifest check error, or a configuration error.
pub fn prepare(
    manifest: &Path,
    config_path: Option<&Path>,
    store_override: Option<&Path>,
) -> Result<LocalFieldSetStore> {
    check_manifest(manifest)?;
    open_store(config_path, store_override)
}

/// Loads the installer configuration and opens the field-set store.
///
/// `store_override` wins over the configured directory and is used as given.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn open_store(
    config_path: Option<&Path>,
    store_override: Option<&Path>,
) -> Result<LocalFieldSetStore> {
    let loaded = ConfigParser::new().resolve(config_path)?;
    if let Some(source) = &loaded.source {
        debug!("Configuration loaded from {}", source.display());
    }

    let store_dir = store_override.map_or_else(|| loaded.store_dir(), Path::to_path_buf);
    let store = LocalFieldSetStore::with_base_dir(store_dir);
    info!(
        "Using {} field-set store at {}",
        store.backend_type(),
        store.base_dir().display()
    );
    Ok(store)
}

/// Maps a command result to its exit status.
#[must_use]
pub const fn exit_status<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
