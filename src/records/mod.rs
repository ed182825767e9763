//! Record subsystem for dynaschema
//!
//! Records are schemaless JSON documents in storage. Everything that gives
//! them shape comes from the live schema:
//! - `SchemaBoundModel` validates writes against it
//! - `RecordProjector` renders reads through it

mod errors;
mod model;
mod projector;
mod repository;
mod resource;

pub use errors::{RecordError, RecordResult};
pub use model::SchemaBoundModel;
pub use projector::{Envelope, RecordProjector};
pub use repository::{InMemoryRecordRepository, JsonFileRecordRepository, RecordRepository};
pub use resource::{RecordResource, ResourceKind, VERSION_FIELD};
