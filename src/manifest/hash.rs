//! Field-set fingerprints.
//!
//! A fingerprint is a SHA-256 digest over the full content of a field-set
//! definition. Equal content always yields the same fingerprint, which lets
//! drift checks compare a manifest entry with a stored record.

use sha2::{Digest, Sha256};

use super::types::{FieldSetDefinition, FieldSpec, Translations};

/// Hasher for computing field-set fingerprints.
#[derive(Debug, Default)]
pub struct DefinitionHasher;

impl DefinitionHasher {
    /// Creates a new definition hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of a field-set definition.
    #[must_use]
    pub fn hash_definition(&self, definition: &FieldSetDefinition) -> String {
        let mut hasher = Sha256::new();

        hasher.update(definition.name.as_bytes());
        update_translations(&mut hasher, &definition.label);
        hasher.update(if definition.global { [1u8] } else { [0u8] });

        // Related entities (sorted, attachment order carries no meaning)
        let mut entities: Vec<_> = definition.related_entities.iter().collect();
        entities.sort_unstable();
        for entity in entities {
            hasher.update(entity.as_bytes());
            hasher.update([0u8]);
        }

        // Fields keep manifest order
        for field in &definition.fields {
            hasher.update(self.hash_field(field).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes the fingerprint of a single field.
    #[must_use]
    pub fn hash_field(&self, field: &FieldSpec) -> String {
        let mut hasher = Sha256::new();

        hasher.update(field.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(field.field_type.tag().as_bytes());
        update_translations(&mut hasher, &field.label);

        // BTreeMap iteration and serde_json object output are both key-ordered
        for (key, value) in &field.config {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Returns the first 8 characters of a fingerprint for display.
    #[must_use]
    pub fn short_hash(hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

fn update_translations(hasher: &mut Sha256, translations: &Translations) {
    for (lang, text) in translations {
        hasher.update(lang.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FieldType;
    use serde_json::json;

    fn loyalty_set() -> FieldSetDefinition {
        FieldSetDefinition::new("customer_loyalty")
            .with_field(FieldSpec::new("points", FieldType::Int).with_label("Points"))
            .with_field(FieldSpec::new("tier", FieldType::Text).with_config("position", json!(2)))
    }

    #[test]
    fn test_definition_hash_deterministic() {
        let hasher = DefinitionHasher::new();
        let set = loyalty_set();

        assert_eq!(hasher.hash_definition(&set), hasher.hash_definition(&set.clone()));
    }

    #[test]
    fn test_field_change_changes_hash() {
        let hasher = DefinitionHasher::new();
        let original = loyalty_set();

        let mut retyped = original.clone();
        retyped.fields[0].field_type = FieldType::Float;
        assert_ne!(hasher.hash_definition(&original), hasher.hash_definition(&retyped));

        let mut reconfigured = original.clone();
        reconfigured.fields[1].config.insert(String::from("position"), json!(3));
        assert_ne!(hasher.hash_definition(&original), hasher.hash_definition(&reconfigured));
    }

    #[test]
    fn test_related_entity_order_ignored() {
        let hasher = DefinitionHasher::new();
        let mut a = loyalty_set();
        a.related_entities = vec![String::from("order"), String::from("customer")];
        let mut b = loyalty_set();
        b.related_entities = vec![String::from("customer"), String::from("order")];

        assert_eq!(hasher.hash_definition(&a), hasher.hash_definition(&b));
    }

    #[test]
    fn test_short_hash() {
        let short = DefinitionHasher::short_hash("abcdef1234567890");
        assert_eq!(short, "abcdef12");
    }
}
