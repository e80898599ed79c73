//! Field-set store module.
//!
//! This module provides the persisted side of reconciliation: the
//! [`FieldSetStore`] interface, the stored record types, and two backends
//! (local JSON files and process memory).

mod backend;
mod local;
mod memory;
mod types;

pub use backend::FieldSetStore;
pub use local::{LocalFieldSetStore, STORE_DIR, SearchIndex};
pub use memory::{MemoryFieldSetStore, StoreCall};
pub use types::{FieldSetCollection, FieldSetRecord, STORE_VERSION, StoredFieldSet};
