//! Record projection
//!
//! Renders stored records the way clients see them. Output is driven by the
//! schema, never by the keys a record happens to carry:
//! - fields are emitted in schema order
//! - hidden fields are skipped
//! - identity fields (`<idField>`, `version`) are promoted out of `data`
//! - keys on the record that the schema no longer declares are dropped
//!
//! Single record:
//!
//! ```json
//! {"resourceType":"finance","financeID":"f-1","version":1,
//!  "data":{"accountName":"Ops","amount":12},
//!  "link":{"rel":"self","href":"/api/v1/finances/f-1"}}
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::schema::SchemaDocument;

use super::resource::{RecordResource, VERSION_FIELD};

/// Rendered record or record collection.
///
/// An empty envelope (`{}`) stands for "no record" and is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Projects raw records through the live schema.
#[derive(Debug, Clone, Copy)]
pub struct RecordProjector {
    resource: RecordResource,
}

impl RecordProjector {
    pub fn new(resource: RecordResource) -> Self {
        Self { resource }
    }

    /// Projects one record, with a self link. `None` or JSON null gives an
    /// empty envelope.
    pub fn project(&self, record: Option<&Value>, schema: &SchemaDocument) -> Envelope {
        let mut envelope = match record {
            Some(record) => self.project_record(record, schema),
            None => return Envelope::empty(),
        };

        if envelope.is_empty() {
            return envelope;
        }

        let id = record
            .and_then(|r| r.get(self.resource.id_field))
            .map(id_segment)
            .unwrap_or_default();
        envelope.0.insert(
            "link".to_string(),
            json!({ "rel": "self", "href": self.resource.record_href(&id) }),
        );
        envelope
    }

    /// Projects a collection. Items carry no links of their own.
    pub fn project_collection(&self, records: &[Value], schema: &SchemaDocument) -> Envelope {
        let items: Vec<Value> = records
            .iter()
            .map(|record| self.project_record(record, schema).into_value())
            .collect();

        let mut out = Map::new();
        out.insert("resourceType".to_string(), Value::from(self.resource.plural));
        out.insert("items".to_string(), Value::Array(items));
        out.insert(
            "link".to_string(),
            json!({ "rel": "self", "href": self.resource.base_path }),
        );
        Envelope(out)
    }

    fn project_record(&self, record: &Value, schema: &SchemaDocument) -> Envelope {
        if record.is_null() {
            return Envelope::empty();
        }

        let mut out = Map::new();
        out.insert("resourceType".to_string(), Value::from(self.resource.name));

        for identity in [self.resource.id_field, VERSION_FIELD] {
            if let Some(value) = record.get(identity) {
                out.insert(identity.to_string(), value.clone());
            }
        }

        let mut data = Map::new();
        for (name, definition) in schema.fields.iter() {
            if definition.hidden || self.resource.is_identity_field(name) {
                continue;
            }
            if let Some(value) = record.get(name) {
                data.insert(name.to_string(), value.clone());
            }
        }
        out.insert("data".to_string(), Value::Object(data));

        Envelope(out)
    }
}

fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
