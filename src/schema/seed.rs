//! Seed documents written by `dynaschema init`

use crate::records::{ResourceKind, VERSION_FIELD};

use super::types::{FieldCatalog, FieldDefinition, FieldType, ScalarType, SchemaDocument, VersionTag};

fn field(t: ScalarType) -> FieldDefinition {
    FieldDefinition::new(FieldType::Scalar(t))
}

/// Initial schema for a resource. Identity fields are system-level.
pub fn seed_document(kind: ResourceKind) -> SchemaDocument {
    let resource = kind.descriptor();

    let mut fields = FieldCatalog::new();
    fields.insert(resource.id_field, field(ScalarType::String).required().system());
    fields.insert(VERSION_FIELD, field(ScalarType::Number).system());

    match kind {
        ResourceKind::Finance => {
            fields.insert("accountName", field(ScalarType::String).required());
            fields.insert("amount", field(ScalarType::Number).required());
            fields.insert("currency", field(ScalarType::String));
            fields.insert("transactionDate", field(ScalarType::Date));
            fields.insert("tags", FieldDefinition::new(FieldType::Array(ScalarType::String)));
            fields.insert("ssn", field(ScalarType::String).hidden());
        }
        ResourceKind::K12 => {
            fields.insert("studentName", field(ScalarType::String).required());
            fields.insert("grade", field(ScalarType::Number));
            fields.insert("schoolName", field(ScalarType::String));
            fields.insert("enrolled", field(ScalarType::Boolean));
            fields.insert("enrollmentDate", field(ScalarType::Date));
        }
    }

    SchemaDocument::new(
        resource.name,
        resource.plural,
        format!("{}History", resource.plural),
        VersionTag::Number(1),
        fields,
    )
}
