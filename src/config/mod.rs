//! Configuration module for the custom field installer.
//!
//! This module handles the installer's own settings:
//! - Parsing the optional `custom-fields.yaml` file
//! - Loading `.env` files and environment overrides
//! - Resolving the store directory

mod parser;
mod settings;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, LoadedConfig, STORE_DIR_ENV, find_config_file,
};
pub use settings::{InstallerConfig, StoreConfig};
