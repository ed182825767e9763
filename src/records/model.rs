//! Schema-bound record model
//!
//! Holds a field mapping compiled from the live schema and validates record
//! writes against it. The registry calls `refresh` after every persisted
//! schema change, so a field added a moment ago is accepted on the next write
//! and a field removed a moment ago is rejected.
//!
//! Validation semantics:
//! - Record must be a JSON object
//! - No fields outside the schema
//! - Required fields present and non-null (identity fields are assigned by
//!   the server and exempt)
//! - Values match their declared type; arrays element by element
//! - `Date` accepts RFC 3339 timestamps and `YYYY-MM-DD`

use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::schema::{FieldType, RecordModelAdapter, ScalarType, SchemaDocument};

use super::errors::{RecordError, RecordResult};
use super::resource::{RecordResource, VERSION_FIELD};

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    field_type: FieldType,
    required: bool,
    system_level: bool,
}

#[derive(Debug, Default)]
struct FieldMapping {
    rules: Vec<FieldRule>,
}

impl FieldMapping {
    fn compile(schema: &SchemaDocument) -> Self {
        let rules = schema
            .fields
            .iter()
            .map(|(name, def)| FieldRule {
                name: name.to_string(),
                field_type: def.field_type,
                required: def.required,
                system_level: def.system_level,
            })
            .collect();
        Self { rules }
    }

    fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// Record model bound to the live schema.
pub struct SchemaBoundModel {
    resource: RecordResource,
    mapping: RwLock<Arc<FieldMapping>>,
}

impl SchemaBoundModel {
    /// Creates a model with an empty mapping. It rejects every field until
    /// the first refresh.
    pub fn new(resource: RecordResource) -> Self {
        Self {
            resource,
            mapping: RwLock::new(Arc::new(FieldMapping::default())),
        }
    }

    pub fn resource(&self) -> &RecordResource {
        &self.resource
    }

    fn mapping(&self) -> Arc<FieldMapping> {
        let mapping = self.mapping.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&mapping)
    }

    /// Validates a complete record against the current mapping.
    pub fn validate(&self, record: &Value) -> RecordResult<()> {
        let mapping = self.mapping();

        let obj = record
            .as_object()
            .ok_or_else(|| RecordError::type_mismatch("$root", "object", json_type_name(record)))?;

        for key in obj.keys() {
            if mapping.rule(key).is_none() {
                return Err(RecordError::unknown_field(key));
            }
        }

        for rule in &mapping.rules {
            match obj.get(&rule.name) {
                Some(value) if !value.is_null() => {
                    validate_value(&rule.name, value, &rule.field_type)?;
                }
                _ => {
                    if rule.required && !rule.system_level {
                        return Err(RecordError::missing_field(&rule.name));
                    }
                }
            }
        }

        Ok(())
    }

    /// Builds a new record from a request body.
    ///
    /// The id is taken from the body when given, otherwise generated.
    /// `version` always starts at 1.
    pub fn prepare_create(&self, body: Value) -> RecordResult<Value> {
        let mut obj = into_object(body)?;
        let id_field = self.resource.id_field;

        let id = match obj.remove(id_field) {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::String(_)) => {
                return Err(RecordError::BadInput(format!(
                    "The field '{}' must not be empty",
                    id_field
                )))
            }
            Some(other) => {
                return Err(RecordError::type_mismatch(id_field, "String", json_type_name(&other)))
            }
        };

        obj.remove(VERSION_FIELD);
        obj.insert(id_field.to_string(), Value::String(id));
        obj.insert(VERSION_FIELD.to_string(), Value::from(1u64));

        let record = Value::Object(obj);
        self.validate(&record)?;
        Ok(record)
    }

    /// Builds the replacement for `existing` from a request body.
    ///
    /// The identity field cannot change; `version` is incremented.
    pub fn prepare_update(&self, id: &str, existing: &Value, body: Value) -> RecordResult<Value> {
        let mut obj = into_object(body)?;
        let id_field = self.resource.id_field;

        match obj.remove(id_field) {
            None | Some(Value::Null) => {}
            Some(Value::String(given)) if given == id => {}
            Some(_) => {
                return Err(RecordError::BadInput(format!(
                    "The field '{}' is immutable",
                    id_field
                )))
            }
        }

        let version = existing
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;

        obj.remove(VERSION_FIELD);
        obj.insert(id_field.to_string(), Value::String(id.to_string()));
        obj.insert(VERSION_FIELD.to_string(), Value::from(version));

        let record = Value::Object(obj);
        self.validate(&record)?;
        Ok(record)
    }
}

impl RecordModelAdapter for SchemaBoundModel {
    fn refresh(&self, schema: &SchemaDocument) {
        let next = Arc::new(FieldMapping::compile(schema));
        let field_count = next.rules.len().to_string();
        {
            let mut mapping = self.mapping.write().unwrap_or_else(|e| e.into_inner());
            *mapping = next;
        }

        log_event_with_fields(
            Event::RecordModelRefreshed,
            &[
                ("fields", field_count.as_str()),
                ("resource", self.resource.name),
            ],
        );
    }
}

fn into_object(body: Value) -> RecordResult<Map<String, Value>> {
    match body {
        Value::Object(obj) => Ok(obj),
        other => Err(RecordError::type_mismatch("$root", "object", json_type_name(&other))),
    }
}

fn validate_value(field: &str, value: &Value, expected: &FieldType) -> RecordResult<()> {
    match expected {
        FieldType::Scalar(scalar) => validate_scalar(field, value, *scalar),
        FieldType::Array(scalar) => {
            let items = value.as_array().ok_or_else(|| {
                RecordError::type_mismatch(field, &expected.to_string(), json_type_name(value))
            })?;

            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", field, i);
                if item.is_null() {
                    return Err(RecordError::type_mismatch(&item_path, scalar.as_str(), "null"));
                }
                validate_scalar(&item_path, item, *scalar)?;
            }
            Ok(())
        }
    }
}

fn validate_scalar(field: &str, value: &Value, expected: ScalarType) -> RecordResult<()> {
    let ok = match expected {
        ScalarType::String => value.is_string(),
        ScalarType::Number => value.is_number(),
        ScalarType::Boolean => value.is_boolean(),
        ScalarType::Date => value.as_str().map(is_date).unwrap_or(false),
    };

    if ok {
        Ok(())
    } else {
        Err(RecordError::type_mismatch(field, expected.as_str(), json_type_name(value)))
    }
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
