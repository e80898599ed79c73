//! In-memory field-set store.
//!
//! Keeps records in process memory and logs every call together with the
//! context it ran under. Used as the test double for reconciliation.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{Result, StoreError};

use super::backend::FieldSetStore;
use super::types::{FieldSetCollection, FieldSetRecord, StoredFieldSet};

/// A call made against a [`MemoryFieldSetStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// Search by name.
    FindByName {
        /// Searched name.
        name: String,
        /// Context of the call.
        context: ExecutionContext,
    },
    /// Insert or update.
    Upsert {
        /// Name of the written record.
        name: String,
        /// Context of the call.
        context: ExecutionContext,
    },
    /// Delete by identity.
    DeleteById {
        /// Deleted id.
        id: String,
        /// Context of the call.
        context: ExecutionContext,
    },
    /// Batch-end index refresh.
    RefreshIndex {
        /// Context of the call.
        context: ExecutionContext,
    },
}

impl StoreCall {
    /// Returns the context the call ran under.
    #[must_use]
    pub const fn context(&self) -> &ExecutionContext {
        match self {
            Self::FindByName { context, .. }
            | Self::Upsert { context, .. }
            | Self::DeleteById { context, .. }
            | Self::RefreshIndex { context } => context,
        }
    }

    /// Returns true for upserts and deletes.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Upsert { .. } | Self::DeleteById { .. })
    }
}

/// In-memory field-set store.
#[derive(Debug, Default)]
pub struct MemoryFieldSetStore {
    /// Stored records.
    collection: Mutex<FieldSetCollection>,
    /// Call log.
    calls: Mutex<Vec<StoreCall>>,
    /// Names whose upserts fail.
    failing_upserts: Mutex<HashSet<String>>,
}

impl MemoryFieldSetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing the call log.
    ///
    /// # Errors
    ///
    /// Returns an error if the record violates the name constraint.
    pub async fn seed(&self, record: FieldSetRecord) -> Result<StoredFieldSet> {
        Ok(self.collection.lock().await.upsert(record)?)
    }

    /// Makes every subsequent upsert of `name` fail.
    pub async fn fail_upserts_for(&self, name: impl Into<String>) {
        self.failing_upserts.lock().await.insert(name.into());
    }

    /// Returns all stored records in store order.
    pub async fn records(&self) -> Vec<StoredFieldSet> {
        self.collection.lock().await.field_sets.clone()
    }

    /// Returns the records named `name`.
    pub async fn records_named(&self, name: &str) -> Vec<StoredFieldSet> {
        self.collection
            .lock()
            .await
            .field_sets
            .iter()
            .filter(|s| s.name() == name)
            .cloned()
            .collect()
    }

    /// Returns the call log.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Returns the number of upserts and deletes made so far.
    pub async fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.is_mutation())
            .count()
    }

    /// Clears the call log.
    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn log(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl FieldSetStore for MemoryFieldSetStore {
    async fn find_by_name(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> Result<Option<StoredFieldSet>> {
        self.log(StoreCall::FindByName {
            name: name.to_string(),
            context: *context,
        })
        .await;

        Ok(self.collection.lock().await.find_by_name(name).cloned())
    }

    async fn upsert(
        &self,
        record: FieldSetRecord,
        context: &ExecutionContext,
    ) -> Result<StoredFieldSet> {
        self.log(StoreCall::Upsert {
            name: record.name().to_string(),
            context: *context,
        })
        .await;

        if self.failing_upserts.lock().await.contains(record.name()) {
            return Err(StoreError::operation(format!(
                "injected failure writing '{}'",
                record.name()
            ))
            .into());
        }

        let stored = self.collection.lock().await.upsert(record)?;
        debug!("Stored custom field set {} as {}", stored.name(), stored.id);
        Ok(stored)
    }

    async fn delete_by_id(&self, id: &str, context: &ExecutionContext) -> Result<()> {
        self.log(StoreCall::DeleteById {
            id: id.to_string(),
            context: *context,
        })
        .await;

        if self.collection.lock().await.delete_by_id(id).is_none() {
            debug!("No custom field set with id {id}, nothing deleted");
        }
        Ok(())
    }

    async fn refresh_index(&self, context: &ExecutionContext) -> Result<()> {
        self.log(StoreCall::RefreshIndex { context: *context }).await;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
