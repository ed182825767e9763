//! Schema subsystem for dynaschema
//!
//! The field catalog of a record resource is data, editable at runtime.
//!
//! # Design Principles
//!
//! - One live schema per process, replaced copy-on-write
//! - Definitions validated before any mutation
//! - A mutation is live only after it was persisted
//! - System-level fields are read-only through the registry
//! - Record models follow every successful change before it is acknowledged

mod errors;
mod registry;
mod seed;
mod store;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorKind, SchemaResult};
pub use registry::{RecordModelAdapter, SchemaRegistry, SchemaSnapshot};
pub use seed::seed_document;
pub use store::{FileSchemaStore, MemorySchemaStore, SchemaStore};
pub(crate) use store::atomic_write;
pub use types::{FieldCatalog, FieldDefinition, FieldType, ScalarType, SchemaDocument, VersionTag};
pub use validator::FieldValidator;
