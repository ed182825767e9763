//! dynaschema - schema registry and record service with a runtime-editable schema
//!
//! The schema governing a record type lives in a persisted document that can
//! be changed through the API while the service runs. Record validation and
//! record rendering always follow the schema that is live at that moment.
//!
//! - `schema`: field definitions, validation, persistence, the registry
//! - `records`: schema-bound model, repositories, projection
//! - `http_server`: axum routes, basic auth, error envelopes
//! - `cli`: `init` and `serve`
//! - `observability`: JSON-lines logging

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod records;
pub mod schema;
