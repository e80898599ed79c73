//! Manifest loading.
//!
//! This module turns a manifest file into [`Manifest`] values. The XML
//! loader reads the `<custom-fields>` section of a manifest document and
//! ignores every other section.

use roxmltree::{Document, Node};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{InstallerError, ManifestError, Result};

use super::types::{
    CustomFieldsSection, DEFAULT_LOCALE, FieldSetDefinition, FieldSpec, FieldType, Manifest,
    Translations,
};
use super::validator::ManifestValidator;

/// Source of parsed manifests.
pub trait ManifestLoader: Send + Sync {
    /// Loads the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the path is not a readable file,
    /// and a parse or validation error for invalid content.
    fn load(&self, path: &Path) -> Result<Manifest>;
}

/// Loader for XML manifest files.
#[derive(Debug, Default)]
pub struct XmlManifestLoader {
    /// Validator applied after parsing.
    validator: ManifestValidator,
}

impl XmlManifestLoader {
    /// Creates a new XML manifest loader.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validator: ManifestValidator::new(),
        }
    }

    /// Parses and validates manifest content.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is malformed or the manifest is invalid.
    pub fn parse_xml(&self, content: &str, source: Option<&Path>) -> Result<Manifest> {
        debug!("Parsing XML manifest");

        let document = Document::parse(content).map_err(|e| {
            ManifestError::parse(
                format!("XML parse error: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;

        let manifest = parse_manifest(&document, source)?;
        self.validator.validate(&manifest)?;

        debug!(
            "Parsed manifest with {} custom field set(s)",
            manifest.field_sets().len()
        );
        Ok(manifest)
    }
}

impl ManifestLoader for XmlManifestLoader {
    fn load(&self, path: &Path) -> Result<Manifest> {
        info!("Loading manifest from: {}", path.display());

        if !path.is_file() {
            return Err(InstallerError::Manifest(ManifestError::NotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;

        self.parse_xml(&content, Some(path))
    }
}

type ParseResult<T> = std::result::Result<T, ManifestError>;

/// Builds a manifest from a parsed document.
fn parse_manifest(document: &Document<'_>, source: Option<&Path>) -> ParseResult<Manifest> {
    let root = document.root_element();
    if root.tag_name().name() != "manifest" {
        return Err(ManifestError::parse(
            format!(
                "expected <manifest> root element, found <{}>",
                root.tag_name().name()
            ),
            Some(location(root, source)),
        ));
    }

    let Some(section) = elements(root).find(|n| n.tag_name().name() == "custom-fields") else {
        debug!("Manifest has no custom-fields section");
        return Ok(Manifest::default());
    };

    let field_sets = elements(section)
        .map(|node| match node.tag_name().name() {
            "custom-field-set" => parse_field_set(node, source),
            other => Err(ManifestError::parse(
                format!("unexpected element <{other}> in <custom-fields>"),
                Some(location(node, source)),
            )),
        })
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Manifest {
        custom_fields: Some(CustomFieldsSection { field_sets }),
    })
}

fn parse_field_set(node: Node<'_, '_>, source: Option<&Path>) -> ParseResult<FieldSetDefinition> {
    let name_node = elements(node)
        .find(|n| n.tag_name().name() == "name")
        .ok_or_else(|| {
            ManifestError::parse(
                "<custom-field-set> is missing a <name> element",
                Some(location(node, source)),
            )
        })?;
    let mut definition = FieldSetDefinition::new(text_of(name_node));

    if let Some(global) = node.attribute("global") {
        definition.global = parse_bool(global, node, source)?;
    }

    for child in elements(node) {
        match child.tag_name().name() {
            "label" => insert_translation(&mut definition.label, child),
            "global" => definition.global = parse_bool(&text_of(child), child, source)?,
            "related-entities" => {
                definition.related_entities = elements(child)
                    .map(|entity| entity.tag_name().name().to_string())
                    .collect();
            }
            "fields" => {
                definition.fields = elements(child)
                    .map(|field| parse_field(field, source))
                    .collect::<ParseResult<Vec<_>>>()?;
            }
            _ => {}
        }
    }

    Ok(definition)
}

fn parse_field(node: Node<'_, '_>, source: Option<&Path>) -> ParseResult<FieldSpec> {
    let tag = node.tag_name().name();
    let field_type = FieldType::from_tag(tag).ok_or_else(|| {
        ManifestError::parse(
            format!("unknown custom field type <{tag}>"),
            Some(location(node, source)),
        )
    })?;

    let name = node.attribute("name").ok_or_else(|| {
        ManifestError::parse(
            format!("<{tag}> field is missing the name attribute"),
            Some(location(node, source)),
        )
    })?;

    let mut field = FieldSpec::new(name.trim(), field_type);

    for child in elements(node) {
        let child_tag = child.tag_name().name();
        match child_tag {
            "label" => insert_translation(&mut field.label, child),
            "help-text" | "placeholder" => {
                insert_config_translation(&mut field.config, &camel_case(child_tag), child);
            }
            "options" => {
                let options = parse_options(child, source)?;
                field.config.insert(String::from("options"), Value::Array(options));
            }
            _ => {
                field
                    .config
                    .insert(camel_case(child_tag), scalar_value(child.text()));
            }
        }
    }

    Ok(field)
}

fn parse_options(node: Node<'_, '_>, source: Option<&Path>) -> ParseResult<Vec<Value>> {
    elements(node)
        .filter(|n| n.tag_name().name() == "option")
        .map(|option| -> ParseResult<Value> {
            let value = option.attribute("value").ok_or_else(|| {
                ManifestError::parse(
                    "<option> is missing the value attribute",
                    Some(location(option, source)),
                )
            })?;

            let mut label = Translations::new();
            for name in elements(option).filter(|n| n.tag_name().name() == "name") {
                insert_translation(&mut label, name);
            }

            let mut entry = Map::new();
            entry.insert(String::from("value"), Value::String(value.to_string()));
            entry.insert(
                String::from("label"),
                Value::Object(
                    label
                        .into_iter()
                        .map(|(lang, text)| (lang, Value::String(text)))
                        .collect(),
                ),
            );
            Ok(Value::Object(entry))
        })
        .collect()
}

/// Iterates over the element children of a node.
fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// Returns the trimmed text content of an element.
fn text_of(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

fn insert_translation(translations: &mut Translations, node: Node<'_, '_>) {
    let lang = node.attribute("lang").unwrap_or(DEFAULT_LOCALE);
    translations.insert(lang.to_string(), text_of(node));
}

fn insert_config_translation(
    config: &mut BTreeMap<String, Value>,
    key: &str,
    node: Node<'_, '_>,
) {
    let lang = node.attribute("lang").unwrap_or(DEFAULT_LOCALE);
    let entry = config
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    if let Value::Object(map) = entry {
        map.insert(lang.to_string(), Value::String(text_of(node)));
    }
}

fn parse_bool(value: &str, node: Node<'_, '_>, source: Option<&Path>) -> ParseResult<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ManifestError::parse(
            format!("invalid boolean value '{other}'"),
            Some(location(node, source)),
        )),
    }
}

/// Converts element text into a typed JSON value.
///
/// Only plain integers (`-12`, `0`) and plain decimals (`0.5`) become
/// numbers. Leading zeros, exponents and signs like `+1` stay strings.
fn scalar_value(text: Option<&str>) -> Value {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Value::Null;
    };

    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    let number = match text.split_once('.') {
        None if is_plain_integer(text) => text.parse::<i64>().ok().map(Number::from),
        Some((int, frac))
            if is_plain_integer(int)
                && !frac.is_empty()
                && frac.bytes().all(|b| b.is_ascii_digit()) =>
        {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    };

    number.map_or_else(|| Value::String(text.to_string()), Value::Number)
}

/// Returns true for an optional minus sign followed by digits without a
/// leading zero.
fn is_plain_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

/// Converts a kebab-case element name into a camelCase config key.
fn camel_case(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut upper = false;
    for c in tag.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Formats the source position of a node.
fn location(node: Node<'_, '_>, source: Option<&Path>) -> String {
    let pos = node.document().text_pos_at(node.range().start);
    source.map_or_else(
        || format!("{}:{}", pos.row, pos.col),
        |path| format!("{}:{}:{}", path.display(), pos.row, pos.col),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOYALTY_MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest>
    <meta>
        <name>LoyaltyPlugin</name>
    </meta>
    <custom-fields>
        <custom-field-set global="true">
            <name>customer_loyalty</name>
            <label>Customer loyalty</label>
            <label lang="de-DE">Kundentreue</label>
            <related-entities>
                <customer/>
                <order/>
            </related-entities>
            <fields>
                <int name="points">
                    <position>1</position>
                    <label>Points</label>
                    <required>true</required>
                    <help-text>Collected points</help-text>
                </int>
                <single-select name="tier">
                    <position>2</position>
                    <label>Tier</label>
                    <options>
                        <option value="gold">
                            <name>Gold</name>
                            <name lang="de-DE">Gold</name>
                        </option>
                        <option value="silver">
                            <name>Silver</name>
                        </option>
                    </options>
                </single-select>
                <float name="rate">
                    <steps>0.5</steps>
                </float>
            </fields>
        </custom-field-set>
    </custom-fields>
</manifest>
"#;

    #[test]
    fn test_parse_full_manifest() {
        let loader = XmlManifestLoader::new();
        let manifest = loader.parse_xml(LOYALTY_MANIFEST, None).unwrap();

        assert_eq!(manifest.field_sets().len(), 1);
        let set = &manifest.field_sets()[0];
        assert_eq!(set.name, "customer_loyalty");
        assert!(set.global);
        assert_eq!(set.related_entities, vec!["customer", "order"]);
        assert_eq!(set.label.get("en-GB").map(String::as_str), Some("Customer loyalty"));
        assert_eq!(set.label.get("de-DE").map(String::as_str), Some("Kundentreue"));
        assert_eq!(set.field_names(), vec!["points", "tier", "rate"]);

        let points = &set.fields[0];
        assert_eq!(points.field_type, FieldType::Int);
        assert_eq!(points.config.get("position"), Some(&json!(1)));
        assert_eq!(points.config.get("required"), Some(&json!(true)));
        assert_eq!(
            points.config.get("helpText"),
            Some(&json!({"en-GB": "Collected points"}))
        );

        let tier = &set.fields[1];
        assert_eq!(tier.field_type, FieldType::SingleSelect);
        assert_eq!(
            tier.config.get("options"),
            Some(&json!([
                {"value": "gold", "label": {"de-DE": "Gold", "en-GB": "Gold"}},
                {"value": "silver", "label": {"en-GB": "Silver"}}
            ]))
        );

        assert_eq!(set.fields[2].config.get("steps"), Some(&json!(0.5)));
    }

    #[test]
    fn test_manifest_without_custom_fields_section() {
        let loader = XmlManifestLoader::new();
        let manifest = loader
            .parse_xml("<manifest><meta><name>x</name></meta></manifest>", None)
            .unwrap();

        assert!(manifest.custom_fields.is_none());
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_empty_custom_fields_section() {
        let loader = XmlManifestLoader::new();
        let manifest = loader
            .parse_xml("<manifest><custom-fields/></manifest>", None)
            .unwrap();

        assert!(manifest.custom_fields.is_some());
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_global_as_child_element() {
        let xml = r"<manifest><custom-fields><custom-field-set>
            <name>flags</name><global>true</global>
        </custom-field-set></custom-fields></manifest>";
        let manifest = XmlManifestLoader::new().parse_xml(xml, None).unwrap();
        assert!(manifest.field_sets()[0].global);
        assert!(manifest.field_sets()[0].fields.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let result = XmlManifestLoader::new().parse_xml("<manifest><custom-fields>", None);
        assert!(matches!(
            result,
            Err(InstallerError::Manifest(ManifestError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_wrong_root_element() {
        let result = XmlManifestLoader::new().parse_xml("<plugin/>", None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("expected <manifest> root element"));
    }

    #[test]
    fn test_unknown_field_type_reports_location() {
        let xml = "<manifest>\n<custom-fields>\n<custom-field-set>\n<name>s</name>\n<fields>\n<checkbox name=\"c\"/>\n</fields>\n</custom-field-set>\n</custom-fields>\n</manifest>";
        let err = XmlManifestLoader::new().parse_xml(xml, None).unwrap_err();

        match err {
            InstallerError::Manifest(ManifestError::ParseError { message, location }) => {
                assert!(message.contains("<checkbox>"));
                assert_eq!(location.as_deref(), Some("6:1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_set_name() {
        let xml = "<manifest><custom-fields><custom-field-set><fields/></custom-field-set></custom-fields></manifest>";
        let err = XmlManifestLoader::new().parse_xml(xml, None).unwrap_err();
        assert!(err.to_string().contains("missing a <name> element"));
    }

    #[test]
    fn test_missing_field_name_attribute() {
        let xml = "<manifest><custom-fields><custom-field-set><name>s</name><fields><text/></fields></custom-field-set></custom-fields></manifest>";
        let err = XmlManifestLoader::new().parse_xml(xml, None).unwrap_err();
        assert!(err.to_string().contains("missing the name attribute"));
    }

    #[test]
    fn test_load_missing_file() {
        let loader = XmlManifestLoader::new();
        let result = loader.load(Path::new("/nonexistent/manifest.xml"));
        assert!(result.unwrap_err().is_manifest_not_found());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LOYALTY_MANIFEST.as_bytes()).unwrap();

        let manifest = XmlManifestLoader::new().load(file.path()).unwrap();
        assert_eq!(manifest.field_sets()[0].name, "customer_loyalty");
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(scalar_value(Some(" 42 ")), json!(42));
        assert_eq!(scalar_value(Some("1.25")), json!(1.25));
        assert_eq!(scalar_value(Some("false")), json!(false));
        assert_eq!(scalar_value(Some("product")), json!("product"));
        assert_eq!(scalar_value(Some("  ")), Value::Null);
        assert_eq!(scalar_value(None), Value::Null);
    }

    #[test]
    fn test_scalar_values_keep_non_plain_numbers_as_text() {
        assert_eq!(scalar_value(Some("007")), json!("007"));
        assert_eq!(scalar_value(Some("1e3")), json!("1e3"));
        assert_eq!(scalar_value(Some("+5")), json!("+5"));
        assert_eq!(scalar_value(Some("1.")), json!("1."));
        assert_eq!(scalar_value(Some(".5")), json!(".5"));
        assert_eq!(scalar_value(Some("-12")), json!(-12));
        assert_eq!(scalar_value(Some("0")), json!(0));
        assert_eq!(scalar_value(Some("0.5")), json!(0.5));
        assert_eq!(scalar_value(Some("99999999999999999999")), json!("99999999999999999999"));
    }

    #[test]
    fn test_load_unreadable_file_is_io_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x3c]).unwrap();

        let err = XmlManifestLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("help-text"), "helpText");
        assert_eq!(camel_case("date-type"), "dateType");
        assert_eq!(camel_case("position"), "position");
    }
}
