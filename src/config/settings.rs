//! Installer configuration types.
//!
//! The configuration file is optional. Every field has a default, so an
//! empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::STORE_DIR;

/// Root configuration structure for `custom-fields.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Field-set store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Field-set store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory of the local store. Relative paths resolve against the
    /// configuration file's directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl InstallerConfig {
    /// Returns the store directory, resolved against `base_dir`.
    #[must_use]
    pub fn store_dir(&self, base_dir: &Path) -> PathBuf {
        self.store.path.as_ref().map_or_else(
            || base_dir.join(STORE_DIR),
            |path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_dir() {
        let config = InstallerConfig::default();
        assert_eq!(
            config.store_dir(Path::new("/srv/shop")),
            PathBuf::from("/srv/shop/.custom-fields")
        );
    }

    #[test]
    fn test_relative_store_dir() {
        let config = InstallerConfig {
            store: StoreConfig {
                path: Some(PathBuf::from("var/fields")),
            },
        };
        assert_eq!(
            config.store_dir(Path::new("/srv/shop")),
            PathBuf::from("/srv/shop/var/fields")
        );
    }

    #[test]
    fn test_absolute_store_dir() {
        let config = InstallerConfig {
            store: StoreConfig {
                path: Some(PathBuf::from("/data/fields")),
            },
        };
        assert_eq!(
            config.store_dir(Path::new("/srv/shop")),
            PathBuf::from("/data/fields")
        );
    }
}
