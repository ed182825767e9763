//! Field definition validation
//!
//! Caller-supplied field definitions are parsed exactly once, here, into a
//! typed `FieldDefinition`. Checks run in a fixed order:
//! 1. `type` must be present
//! 2. `systemLevel` must not be set (server-assigned only)
//! 3. `type` must be a whitelisted scalar or a one-element sequence of one
//! 4. `required` / `hidden` must be booleans or boolean-like strings
//!
//! Validation is pure: no I/O, no access to the live schema.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaErrorKind, SchemaResult};
use super::types::{FieldDefinition, FieldType, ScalarType, SchemaDocument};

/// Validator for caller-supplied field definitions.
pub struct FieldValidator;

impl FieldValidator {
    /// Validates a raw definition and returns it normalized.
    ///
    /// `required` and `hidden` are coerced: JSON booleans are taken as-is,
    /// strings compare case-insensitively to `"true"`, absent or null means
    /// false. `systemLevel` on the result is always false.
    ///
    /// # Errors
    ///
    /// Returns a `BadInput` error if:
    /// - `type` is absent
    /// - `systemLevel` is supplied
    /// - `type` is not a whitelisted scalar or one-element sequence of one
    /// - a flag has a shape other than boolean or string
    pub fn validate(input: &Value) -> SchemaResult<FieldDefinition> {
        let obj = match input.as_object() {
            Some(obj) => obj,
            None => return Err(SchemaError::missing_type()),
        };

        let raw_type = match obj.get("type") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {
                return Err(SchemaError::missing_type())
            }
            Some(Value::String(s)) if s.is_empty() => return Err(SchemaError::missing_type()),
            Some(t) => t,
        };

        match obj.get("systemLevel") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => {}
            Some(_) => return Err(SchemaError::reserved_system_level()),
        }

        let field_type = parse_field_type(raw_type)?;

        Ok(FieldDefinition {
            field_type,
            required: parse_flag(obj, "required")?,
            hidden: parse_flag(obj, "hidden")?,
            system_level: false,
        })
    }

    /// Validates a field name. Names become record keys and XML element
    /// names: a letter or underscore, then letters, digits, `_` or `-`.
    /// Any Unicode letter counts.
    pub fn validate_name(name: &str) -> SchemaResult<()> {
        if field_name_pattern().is_match(name) {
            Ok(())
        } else {
            Err(SchemaError::invalid_field_name(name))
        }
    }

    /// Structural check on a whole document, run when a schema is loaded.
    pub fn validate_document(document: &SchemaDocument) -> SchemaResult<()> {
        if document.schema_name.trim().is_empty() || document.collection_name.trim().is_empty() {
            return Err(SchemaError::new(
                SchemaErrorKind::ValidationFailed,
                "schemaName and collectionName must not be empty",
            ));
        }

        for name in document.fields.names() {
            if !field_name_pattern().is_match(name) {
                return Err(SchemaError::new(
                    SchemaErrorKind::ValidationFailed,
                    format!("Schema '{}' declares invalid field name '{}'", document.schema_name, name),
                ));
            }
        }

        Ok(())
    }
}

fn field_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\p{L}_][\p{L}\p{N}_-]*$").expect("field name pattern is valid")
    })
}

/// Parses the wire form of a field type: `"Number"` or `["Number"]`.
pub fn parse_field_type(value: &Value) -> SchemaResult<FieldType> {
    match value {
        Value::String(name) => ScalarType::from_name(name)
            .map(FieldType::Scalar)
            .ok_or_else(SchemaError::invalid_type),
        Value::Array(items) => match items.as_slice() {
            [Value::String(name)] => ScalarType::from_name(name)
                .map(FieldType::Array)
                .ok_or_else(SchemaError::invalid_type),
            _ => Err(SchemaError::invalid_type()),
        },
        _ => Err(SchemaError::invalid_type()),
    }
}

fn parse_flag(obj: &Map<String, Value>, key: &str) -> SchemaResult<bool> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => Ok(s.eq_ignore_ascii_case("true")),
        Some(_) => Err(SchemaError::invalid_flag(key)),
    }
}
