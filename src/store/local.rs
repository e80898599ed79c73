//! Local file-based field-set store.
//!
//! Records live in a single JSON document. Every write rewrites the
//! document atomically, so each call observes the writes before it.
//! A search index file mapping names to ids is refreshed after writes whose
//! context allows lifecycle side effects, or on request once a batch of
//! suppressed writes is done.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::error::{Result, StoreError};

use super::backend::FieldSetStore;
use super::types::{FieldSetCollection, FieldSetRecord, StoredFieldSet};

/// Default store directory name.
pub const STORE_DIR: &str = ".custom-fields";

/// Record file name.
const DATA_FILE: &str = "field_sets.json";

/// Search index file name.
const INDEX_FILE: &str = "search_index.json";

/// Name lookup index maintained next to the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    /// When the index was last rebuilt.
    pub refreshed_at: DateTime<Utc>,
    /// Field-set name to record id.
    pub entries: BTreeMap<String, String>,
}

/// Local file-based field-set store.
#[derive(Debug)]
pub struct LocalFieldSetStore {
    /// Base directory for store files.
    base_dir: PathBuf,
    /// Path to the record file.
    data_path: PathBuf,
    /// Path to the search index file.
    index_path: PathBuf,
}

impl LocalFieldSetStore {
    /// Creates a local store rooted at `base_dir`.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let data_path = base_dir.join(DATA_FILE);
        let index_path = base_dir.join(INDEX_FILE);

        Self {
            base_dir,
            data_path,
            index_path,
        }
    }

    /// Returns the store directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Reads every stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record file exists but cannot be read.
    pub async fn load_all(&self) -> Result<Vec<StoredFieldSet>> {
        Ok(self.read_collection().await?.field_sets)
    }

    /// Reads the search index, if one has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the index file exists but cannot be read.
    pub async fn read_index(&self) -> Result<Option<SearchIndex>> {
        if !self.index_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.index_path).await.map_err(|e| StoreError::Corrupted {
            message: format!("Failed to read search index: {e}"),
        })?;

        let index = serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
            message: format!("Failed to parse search index: {e}"),
        })?;

        Ok(Some(index))
    }

    /// Ensures the store directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating store directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir).await.map_err(|e| {
                StoreError::operation(format!("Failed to create store directory: {e}"))
            })?;
        }
        Ok(())
    }

    /// Reads the record file, or an empty collection if none exists.
    async fn read_collection(&self) -> Result<FieldSetCollection> {
        if !self.data_path.exists() {
            debug!("Store file does not exist: {}", self.data_path.display());
            return Ok(FieldSetCollection::new());
        }

        let content = fs::read_to_string(&self.data_path).await.map_err(|e| StoreError::Corrupted {
            message: format!("Failed to read store file: {e}"),
        })?;

        let collection = serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
            message: format!("Failed to parse store file: {e}"),
        })?;

        Ok(collection)
    }

    /// Writes the record file atomically.
    async fn write_collection(&self, collection: &FieldSetCollection) -> Result<()> {
        let content = serde_json::to_string_pretty(collection)
            .map_err(|e| StoreError::serialization(format!("Failed to serialize store: {e}")))?;

        self.write_atomic(&self.data_path, &content).await
    }

    /// Rebuilds the search index from a collection.
    async fn write_index(&self, collection: &FieldSetCollection) -> Result<()> {
        let index = SearchIndex {
            refreshed_at: Utc::now(),
            entries: collection
                .field_sets
                .iter()
                .map(|s| (s.name().to_string(), s.id.clone()))
                .collect(),
        };

        let content = serde_json::to_string_pretty(&index)
            .map_err(|e| StoreError::serialization(format!("Failed to serialize search index: {e}")))?;

        self.write_atomic(&self.index_path, &content).await?;
        debug!("Search index refreshed with {} entries", index.entries.len());
        Ok(())
    }

    /// Persists a modified collection and runs the side effects the context
    /// allows.
    async fn commit(&self, collection: &FieldSetCollection, context: &ExecutionContext) -> Result<()> {
        self.write_collection(collection).await?;

        if context.triggers_side_effects() {
            self.write_index(collection).await?;
        } else {
            debug!("Search index refresh suppressed by execution context");
        }
        Ok(())
    }

    /// Writes to a temporary file first, then renames it over `path`.
    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        self.ensure_dir().await?;

        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            StoreError::operation(format!("Failed to create temp file {}: {e}", temp_path.display()))
        })?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| StoreError::operation(format!("Failed to write store file: {e}")))?;

        file.sync_all()
            .await
            .map_err(|e| StoreError::operation(format!("Failed to sync store file: {e}")))?;

        fs::rename(&temp_path, path).await.map_err(|e| {
            StoreError::operation(format!("Failed to rename store file: {e}"))
        })?;

        Ok(())
    }
}

#[async_trait]
impl FieldSetStore for LocalFieldSetStore {
    async fn find_by_name(
        &self,
        name: &str,
        _context: &ExecutionContext,
    ) -> Result<Option<StoredFieldSet>> {
        let collection = self.read_collection().await?;
        Ok(collection.find_by_name(name).cloned())
    }

    async fn upsert(
        &self,
        record: FieldSetRecord,
        context: &ExecutionContext,
    ) -> Result<StoredFieldSet> {
        let mut collection = self.read_collection().await?;
        let stored = collection.upsert(record)?;
        self.commit(&collection, context).await?;

        info!("Stored custom field set {} ({})", stored.name(), stored.id);
        Ok(stored)
    }

    async fn delete_by_id(&self, id: &str, context: &ExecutionContext) -> Result<()> {
        let mut collection = self.read_collection().await?;

        match collection.delete_by_id(id) {
            Some(removed) => {
                self.commit(&collection, context).await?;
                info!("Deleted custom field set {} ({id})", removed.name());
            }
            None => debug!("No custom field set with id {id}, nothing deleted"),
        }
        Ok(())
    }

    async fn refresh_index(&self, context: &ExecutionContext) -> Result<()> {
        if !context.triggers_side_effects() {
            debug!("Search index refresh suppressed by execution context");
            return Ok(());
        }

        let collection = self.read_collection().await?;
        self.write_index(&collection).await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use crate::manifest::{FieldSetDefinition, FieldSpec, FieldType};
    use tempfile::TempDir;

    fn create_test_store() -> (LocalFieldSetStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = LocalFieldSetStore::with_base_dir(temp_dir.path().join("store"));
        (store, temp_dir)
    }

    fn record(name: &str) -> FieldSetRecord {
        FieldSetRecord::from_definition(
            &FieldSetDefinition::new(name).with_field(FieldSpec::new("points", FieldType::Int)),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let (store, _temp) = create_test_store();
        let context = ExecutionContext::new();

        let stored = store.upsert(record("loyalty"), &context).await.expect("upsert failed");

        let found = store
            .find_by_name("loyalty", &context)
            .await
            .expect("find failed")
            .expect("record should exist");
        assert_eq!(found, stored);

        assert!(store.find_by_name("other", &context).await.expect("find failed").is_none());
    }

    #[tokio::test]
    async fn test_find_in_empty_store() {
        let (store, _temp) = create_test_store();

        let result = store
            .find_by_name("anything", &ExecutionContext::new())
            .await
            .expect("find should not fail");
        assert!(result.is_none());
        assert!(!store.base_dir().exists());
    }

    #[tokio::test]
    async fn test_records_persist_across_instances() {
        let (store, temp) = create_test_store();
        store.upsert(record("a"), &ExecutionContext::new()).await.expect("upsert failed");

        let reopened = LocalFieldSetStore::with_base_dir(temp.path().join("store"));
        let records = reopened.load_all().await.expect("load failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "a");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (store, _temp) = create_test_store();
        store.upsert(record("a"), &ExecutionContext::new()).await.expect("upsert failed");

        store
            .delete_by_id("does-not-exist", &ExecutionContext::new())
            .await
            .expect("delete should not fail");
        assert_eq!(store.load_all().await.expect("load failed").len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (store, _temp) = create_test_store();
        let context = ExecutionContext::new();
        store.upsert(record("a"), &context).await.expect("upsert failed");

        let result = store.upsert(record("a"), &context).await;
        assert!(matches!(
            result,
            Err(InstallerError::Store(StoreError::ConstraintViolation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_index_refreshed_in_default_context() {
        let (store, _temp) = create_test_store();

        let stored = store.upsert(record("a"), &ExecutionContext::new()).await.expect("upsert failed");

        let index = store.read_index().await.expect("read failed").expect("index should exist");
        assert_eq!(index.entries.get("a"), Some(&stored.id));
    }

    #[tokio::test]
    async fn test_index_untouched_in_system_scope() {
        let (store, _temp) = create_test_store();
        let system = ExecutionContext::new().elevated();

        store.upsert(record("a"), &system).await.expect("upsert failed");
        assert!(store.read_index().await.expect("read failed").is_none());
    }

    #[tokio::test]
    async fn test_index_untouched_with_indexing_disabled() {
        let (store, _temp) = create_test_store();
        let stored = store.upsert(record("a"), &ExecutionContext::new()).await.expect("upsert failed");

        let quiet = ExecutionContext::new().without_indexing();
        store.delete_by_id(&stored.id, &quiet).await.expect("delete failed");

        assert!(store.load_all().await.expect("load failed").is_empty());
        let index = store.read_index().await.expect("read failed").expect("index should exist");
        assert_eq!(index.entries.get("a"), Some(&stored.id));
    }

    #[tokio::test]
    async fn test_refresh_index_after_system_writes() {
        let (store, _temp) = create_test_store();
        let system = ExecutionContext::new().elevated();
        let stored = store.upsert(record("a"), &system).await.expect("upsert failed");

        store.refresh_index(&system).await.expect("refresh failed");
        assert!(store.read_index().await.expect("read failed").is_none());

        store
            .refresh_index(&ExecutionContext::new())
            .await
            .expect("refresh failed");
        let index = store.read_index().await.expect("read failed").expect("index should exist");
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries.get("a"), Some(&stored.id));
    }

    #[tokio::test]
    async fn test_corrupted_store_file() {
        let (store, _temp) = create_test_store();
        std::fs::create_dir_all(store.base_dir()).expect("mkdir failed");
        std::fs::write(store.base_dir().join(DATA_FILE), "{not json").expect("write failed");

        let result = store.find_by_name("a", &ExecutionContext::new()).await;
        assert!(matches!(
            result,
            Err(InstallerError::Store(StoreError::Corrupted { .. }))
        ));
    }
}
