//! Field-set store trait definition.
//!
//! This module defines the common interface for field-set storage backends.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::Result;
use super::types::{FieldSetRecord, StoredFieldSet};

/// Trait for field-set storage backends.
///
/// Every call receives the execution context of the operation so the
/// backend can decide which lifecycle side effects to run.
#[async_trait]
pub trait FieldSetStore: Send + Sync {
    /// Searches for a record whose name equals `name` exactly.
    ///
    /// Returns the first match in store order, or `None`.
    async fn find_by_name(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> Result<Option<StoredFieldSet>>;

    /// Inserts or updates a record by identity and returns the stored record.
    async fn upsert(
        &self,
        record: FieldSetRecord,
        context: &ExecutionContext,
    ) -> Result<StoredFieldSet>;

    /// Deletes the record with the given id. Unknown ids are a no-op.
    async fn delete_by_id(&self, id: &str, context: &ExecutionContext) -> Result<()>;

    /// Rebuilds the search index from the stored records.
    ///
    /// Called once after a batch of writes whose per-write index refresh
    /// was suppressed. Does nothing unless `context` triggers side effects.
    async fn refresh_index(&self, context: &ExecutionContext) -> Result<()>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl FieldSetStore for Box<dyn FieldSetStore> {
    async fn find_by_name(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> Result<Option<StoredFieldSet>> {
        (**self).find_by_name(name, context).await
    }

    async fn upsert(
        &self,
        record: FieldSetRecord,
        context: &ExecutionContext,
    ) -> Result<StoredFieldSet> {
        (**self).upsert(record, context).await
    }

    async fn delete_by_id(&self, id: &str, context: &ExecutionContext) -> Result<()> {
        (**self).delete_by_id(id, context).await
    }

    async fn refresh_index(&self, context: &ExecutionContext) -> Result<()> {
        (**self).refresh_index(context).await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
