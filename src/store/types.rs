//! Stored field-set records.
//!
//! These types describe the persisted side of reconciliation. Every backend
//! keeps its records in a [`FieldSetCollection`], which also enforces the
//! name-uniqueness constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::manifest::{FieldSetDefinition, FieldSpec};

/// Current version of the persisted collection format.
pub const STORE_VERSION: &str = "1.0";

/// Payload written by an upsert.
///
/// Without an id the store inserts a new record and assigns a fresh id.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSetRecord {
    /// Identity of the record to update, if any.
    pub id: Option<String>,
    /// Field-set content.
    pub payload: FieldSetDefinition,
}

/// A field set persisted in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFieldSet {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Field-set content.
    #[serde(flatten)]
    pub payload: FieldSetDefinition,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

/// Ordered collection of stored field sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSetCollection {
    /// Collection format version.
    pub version: String,
    /// Records in insertion order.
    pub field_sets: Vec<StoredFieldSet>,
    /// When the collection was last modified.
    pub last_updated: DateTime<Utc>,
}

impl FieldSetRecord {
    /// Creates an insert record from a manifest definition.
    #[must_use]
    pub fn from_definition(definition: &FieldSetDefinition) -> Self {
        Self {
            id: None,
            payload: definition.clone(),
        }
    }

    /// Returns the field-set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.payload.name
    }
}

impl StoredFieldSet {
    /// Returns the field-set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.payload.name
    }

    /// Returns the stored fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.payload.fields
    }
}

impl Default for FieldSetCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSetCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION.to_string(),
            field_sets: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Returns the first record with exactly the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&StoredFieldSet> {
        self.field_sets.iter().find(|s| s.name() == name)
    }

    /// Returns the record with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoredFieldSet> {
        self.field_sets.iter().find(|s| s.id == id)
    }

    /// Inserts or updates a record by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConstraintViolation`] if another record already
    /// holds the name.
    pub fn upsert(&mut self, record: FieldSetRecord) -> Result<StoredFieldSet, StoreError> {
        let id = record.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(holder) = self
            .field_sets
            .iter()
            .find(|s| s.name() == record.payload.name && s.id != id)
        {
            return Err(StoreError::constraint(format!(
                "custom field set name '{}' is already used by record {}",
                record.payload.name, holder.id
            )));
        }

        let now = Utc::now();
        self.last_updated = now;

        if let Some(existing) = self.field_sets.iter_mut().find(|s| s.id == id) {
            existing.payload = record.payload;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let stored = StoredFieldSet {
            id,
            payload: record.payload,
            created_at: now,
            updated_at: now,
        };
        self.field_sets.push(stored.clone());
        Ok(stored)
    }

    /// Removes the record with the given id, returning it if it existed.
    pub fn delete_by_id(&mut self, id: &str) -> Option<StoredFieldSet> {
        let index = self.field_sets.iter().position(|s| s.id == id)?;
        self.last_updated = Utc::now();
        Some(self.field_sets.remove(index))
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.field_sets.len()
    }

    /// Returns true if the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FieldType;

    fn record(name: &str) -> FieldSetRecord {
        FieldSetRecord::from_definition(
            &FieldSetDefinition::new(name).with_field(FieldSpec::new("f", FieldType::Text)),
        )
    }

    #[test]
    fn test_insert_assigns_fresh_ids() {
        let mut collection = FieldSetCollection::new();

        let a = collection.upsert(record("a")).unwrap();
        let b = collection.upsert(record("b")).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.find_by_name("b").map(|s| s.id.as_str()), Some(b.id.as_str()));
    }

    #[test]
    fn test_insert_duplicate_name_violates_constraint() {
        let mut collection = FieldSetCollection::new();
        collection.upsert(record("a")).unwrap();

        let result = collection.upsert(record("a"));
        assert!(matches!(result, Err(StoreError::ConstraintViolation { .. })));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_update_by_id_keeps_identity() {
        let mut collection = FieldSetCollection::new();
        let created = collection.upsert(record("a")).unwrap();

        let mut update = record("a");
        update.id = Some(created.id.clone());
        update.payload.fields.clear();
        let updated = collection.upsert(update).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.fields().is_empty());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_delete_by_id() {
        let mut collection = FieldSetCollection::new();
        let created = collection.upsert(record("a")).unwrap();

        assert!(collection.delete_by_id("unknown").is_none());
        let removed = collection.delete_by_id(&created.id).unwrap();
        assert_eq!(removed.name(), "a");
        assert!(collection.is_empty());
        assert!(collection.get(&created.id).is_none());
    }

    #[test]
    fn test_stored_field_set_json_layout() {
        let mut collection = FieldSetCollection::new();
        let created = collection.upsert(record("a")).unwrap();

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["name"], "a");
        assert_eq!(json["fields"][0]["type"], "text");

        let back: StoredFieldSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, created);
    }
}
