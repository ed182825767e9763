//! Schema type definitions
//!
//! Supported field types:
//! - String: UTF-8 string
//! - Number: JSON number
//! - Date: RFC 3339 timestamp or `YYYY-MM-DD`
//! - Boolean: true / false
//! - [T]: homogeneous array of one of the scalars above
//!
//! The field catalog keeps insertion order. Projection walks the catalog,
//! so the order fields were added is the order they are rendered in.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::SchemaError;
use super::validator::parse_field_type;

/// Scalar types a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Number,
    Date,
    Boolean,
}

impl ScalarType {
    /// Every whitelisted scalar, in the order used for error messages
    pub const ALL: [ScalarType; 4] = [
        ScalarType::String,
        ScalarType::Number,
        ScalarType::Date,
        ScalarType::Boolean,
    ];

    /// Returns the wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Number => "Number",
            ScalarType::Date => "Date",
            ScalarType::Boolean => "Boolean",
        }
    }

    /// Parses a wire name. Matching is exact: "string" is not "String".
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field type: a scalar or a one-element sequence naming the array element type.
///
/// On the wire this is `"Number"` or `["Number"]`. Any other shape is rejected
/// when parsing, including when a persisted schema file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FieldType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl FieldType {
    /// Returns the element type for arrays, the type itself for scalars
    pub fn scalar(&self) -> ScalarType {
        match self {
            FieldType::Scalar(t) | FieldType::Array(t) => *t,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::Array(_))
    }

    /// Wire representation
    pub fn to_value(&self) -> Value {
        match self {
            FieldType::Scalar(t) => Value::String(t.as_str().to_string()),
            FieldType::Array(t) => Value::Array(vec![Value::String(t.as_str().to_string())]),
        }
    }
}

impl TryFrom<Value> for FieldType {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        parse_field_type(&value)
    }
}

impl From<FieldType> for Value {
    fn from(field_type: FieldType) -> Self {
        field_type.to_value()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(t) => write!(f, "{}", t),
            FieldType::Array(t) => write!(f, "[{}]", t),
        }
    }
}

/// A single field definition.
///
/// `system_level` is owned by the server: it is only ever true for fields that
/// came from the seed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub system_level: bool,
}

impl FieldDefinition {
    /// A plain optional, visible field
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            hidden: false,
            system_level: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks the field as owned by the server (seed documents only)
    pub fn system(mut self) -> Self {
        self.system_level = true;
        self
    }
}

/// Field definitions keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    entries: IndexMap<String, FieldDefinition>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Inserts or replaces a definition. A replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, definition: FieldDefinition) {
        self.entries.insert(name.into(), definition);
    }

    /// Removes a definition, returning it if it was present. Later fields
    /// move up; their relative order is kept.
    pub fn remove(&mut self, name: &str) -> Option<FieldDefinition> {
        self.entries.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldDefinition)> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = (S, FieldDefinition)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, d)| (n.into(), d)).collect(),
        }
    }
}

/// Opaque schema version tag, carried through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionTag {
    Number(i64),
    Text(String),
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionTag::Number(n) => write!(f, "{}", n),
            VersionTag::Text(s) => f.write_str(s),
        }
    }
}

/// The whole schema document, as persisted.
///
/// Persisted layout keeps the field catalog under `schema`:
///
/// ```json
/// {"schemaName":"finance","collectionName":"finances",
///  "historyCollectionName":"financesHistory","version":1,
///  "schema":{"financeID":{"type":"String","required":true,"systemLevel":true}}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub schema_name: String,
    pub collection_name: String,
    pub history_collection_name: String,
    pub version: VersionTag,
    #[serde(rename = "schema")]
    pub fields: FieldCatalog,
}

impl SchemaDocument {
    pub fn new(
        schema_name: impl Into<String>,
        collection_name: impl Into<String>,
        history_collection_name: impl Into<String>,
        version: VersionTag,
        fields: FieldCatalog,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            collection_name: collection_name.into(),
            history_collection_name: history_collection_name.into(),
            version,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> SchemaDocument {
        let fields: FieldCatalog = vec![
            (
                "financeID",
                FieldDefinition::new(FieldType::Scalar(ScalarType::String))
                    .required()
                    .system(),
            ),
            ("amount", FieldDefinition::new(FieldType::Scalar(ScalarType::Number))),
            ("tags", FieldDefinition::new(FieldType::Array(ScalarType::String))),
        ]
        .into_iter()
        .collect();

        SchemaDocument::new("finance", "finances", "financesHistory", VersionTag::Number(1), fields)
    }

    #[test]
    fn test_scalar_names_are_exact() {
        assert_eq!(ScalarType::from_name("Number"), Some(ScalarType::Number));
        assert_eq!(ScalarType::from_name("number"), None);
        assert_eq!(ScalarType::from_name("Integer"), None);
    }

    #[test]
    fn test_field_type_wire_shape() {
        assert_eq!(FieldType::Scalar(ScalarType::Date).to_value(), json!("Date"));
        assert_eq!(FieldType::Array(ScalarType::Boolean).to_value(), json!(["Boolean"]));
        assert_eq!(FieldType::Array(ScalarType::Boolean).to_string(), "[Boolean]");
    }

    #[test]
    fn test_catalog_keeps_insertion_order() {
        let mut catalog = FieldCatalog::new();
        catalog.insert("zeta", FieldDefinition::new(FieldType::Scalar(ScalarType::String)));
        catalog.insert("alpha", FieldDefinition::new(FieldType::Scalar(ScalarType::String)));
        catalog.insert("mid", FieldDefinition::new(FieldType::Scalar(ScalarType::String)));

        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        // Replacing keeps the slot
        catalog.insert("zeta", FieldDefinition::new(FieldType::Scalar(ScalarType::Number)));
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        assert!(catalog.remove("alpha").is_some());
        assert!(catalog.remove("alpha").is_none());
        assert_eq!(catalog.len(), 2);

        catalog.insert("omega", FieldDefinition::new(FieldType::Scalar(ScalarType::Date)));
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["zeta", "mid", "omega"]);
    }

    #[test]
    fn test_document_persisted_layout() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["schemaName"], "finance");
        assert_eq!(value["historyCollectionName"], "financesHistory");
        assert_eq!(value["schema"]["financeID"]["systemLevel"], true);
        assert_eq!(value["schema"]["tags"]["type"], json!(["String"]));

        let text = serde_json::to_string(&doc).unwrap();
        let back: SchemaDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
        let names: Vec<_> = back.fields.names().collect();
        assert_eq!(names, vec!["financeID", "amount", "tags"]);
    }

    #[test]
    fn test_seed_defaults_flags_to_false() {
        let doc: SchemaDocument = serde_json::from_value(json!({
            "schemaName": "k12",
            "collectionName": "k12s",
            "historyCollectionName": "k12sHistory",
            "version": "v1",
            "schema": { "grade": { "type": "Number" } }
        }))
        .unwrap();

        let grade = doc.field("grade").unwrap();
        assert!(!grade.required);
        assert!(!grade.hidden);
        assert!(!grade.system_level);
        assert_eq!(doc.version, VersionTag::Text("v1".into()));
    }

    #[test]
    fn test_invalid_type_rejected_on_load() {
        let result: Result<SchemaDocument, _> = serde_json::from_value(json!({
            "schemaName": "k12",
            "collectionName": "k12s",
            "historyCollectionName": "k12sHistory",
            "version": 1,
            "schema": { "grade": { "type": "Integer" } }
        }));
        assert!(result.is_err());
    }
}
