//! Manifest data model.
//!
//! These types describe the desired state declared by a manifest file.
//! They are built once per load and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Locale used for labels that carry no `lang` attribute.
pub const DEFAULT_LOCALE: &str = "en-GB";

/// Translated text keyed by locale.
pub type Translations = BTreeMap<String, String>;

/// A parsed manifest file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// The custom-fields section, if the manifest declares one.
    pub custom_fields: Option<CustomFieldsSection>,
}

/// The custom-fields section of a manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFieldsSection {
    /// Field sets in manifest order.
    pub field_sets: Vec<FieldSetDefinition>,
}

/// A named group of custom fields declared by the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSetDefinition {
    /// Natural key used to match stored records.
    pub name: String,
    /// Display label per locale.
    #[serde(default)]
    pub label: Translations,
    /// Whether the set is visible to every sales channel.
    #[serde(default)]
    pub global: bool,
    /// Entities the set is attached to (`product`, `customer`, ...).
    #[serde(default)]
    pub related_entities: Vec<String>,
    /// Field specifications in manifest order.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// A single custom field inside a field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Technical field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display label per locale.
    #[serde(default)]
    pub label: Translations,
    /// Remaining field configuration (position, required, options, ...).
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

/// Custom field types a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Integer number.
    Int,
    /// Floating point number.
    Float,
    /// Single-line text.
    Text,
    /// Multi-line text.
    TextArea,
    /// Boolean switch or checkbox.
    Bool,
    /// Date and time.
    Datetime,
    /// Single choice from fixed options.
    SingleSelect,
    /// Multiple choices from fixed options.
    MultiSelect,
    /// Single reference to another entity.
    SingleEntitySelect,
    /// Multiple references to another entity.
    MultiEntitySelect,
    /// Media reference.
    MediaSelection,
    /// Color value.
    ColorPicker,
    /// Price value.
    Price,
}

impl FieldType {
    /// All field types, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Int,
        Self::Float,
        Self::Text,
        Self::TextArea,
        Self::Bool,
        Self::Datetime,
        Self::SingleSelect,
        Self::MultiSelect,
        Self::SingleEntitySelect,
        Self::MultiEntitySelect,
        Self::MediaSelection,
        Self::ColorPicker,
        Self::Price,
    ];

    /// Returns the manifest element name for this type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::TextArea => "text-area",
            Self::Bool => "bool",
            Self::Datetime => "datetime",
            Self::SingleSelect => "single-select",
            Self::MultiSelect => "multi-select",
            Self::SingleEntitySelect => "single-entity-select",
            Self::MultiEntitySelect => "multi-entity-select",
            Self::MediaSelection => "media-selection",
            Self::ColorPicker => "color-picker",
            Self::Price => "price",
        }
    }

    /// Looks up a field type by its manifest element name.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Manifest {
    /// Returns the declared field sets, or an empty slice without a
    /// custom-fields section.
    #[must_use]
    pub fn field_sets(&self) -> &[FieldSetDefinition] {
        self.custom_fields
            .as_ref()
            .map(|section| section.field_sets.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if the manifest declares no field sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_sets().is_empty()
    }
}

impl FieldSetDefinition {
    /// Creates a definition with the given name and no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Translations::new(),
            global: false,
            related_entities: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the definition.
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns field names in manifest order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl FieldSpec {
    /// Creates a field with no label or configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: Translations::new(),
            config: BTreeMap::new(),
        }
    }

    /// Sets the label for the default locale.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label.insert(DEFAULT_LOCALE.to_string(), label.into());
        self
    }

    /// Adds a configuration entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_tags_are_unique() {
        for field_type in FieldType::ALL {
            assert_eq!(FieldType::from_tag(field_type.tag()), Some(field_type));
        }
        assert_eq!(FieldType::from_tag("checkbox"), None);
    }

    #[test]
    fn test_field_type_serializes_as_tag() {
        let json = serde_json::to_string(&FieldType::SingleEntitySelect).unwrap();
        assert_eq!(json, "\"single-entity-select\"");
    }

    #[test]
    fn test_manifest_without_section_is_empty() {
        let manifest = Manifest::default();
        assert!(manifest.is_empty());
        assert!(manifest.field_sets().is_empty());

        let manifest = Manifest {
            custom_fields: Some(CustomFieldsSection::default()),
        };
        assert!(manifest.is_empty());
    }
}
