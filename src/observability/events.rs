//! Observable events
//!
//! Every log line the service emits is named by one of these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Seed schema written by `init`
    SchemaInitialized,
    /// HTTP listener bound and serving
    ServerStarted,
    /// Server exited with an error
    ServerFailed,

    // Schema registry
    /// Persisted schema loaded at startup
    SchemaLoaded,
    /// Field added and persisted
    SchemaFieldAdded,
    /// Field definition replaced and persisted
    SchemaFieldUpdated,
    /// Field removed and persisted
    SchemaFieldDeleted,
    /// Store rejected a schema write; live schema unchanged
    SchemaPersistFailed,

    // Records
    /// Record model rebuilt from the live schema
    RecordModelRefreshed,

    // HTTP boundary
    /// Request served
    HttpRequest,
    /// Request rejected by basic auth
    AuthRejected,
    /// Response could not be rendered in the negotiated format
    ResponseRenderFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaInitialized => "SCHEMA_INITIALIZED",
            Event::ServerStarted => "SERVER_STARTED",
            Event::ServerFailed => "SERVER_FAILED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaFieldAdded => "SCHEMA_FIELD_ADDED",
            Event::SchemaFieldUpdated => "SCHEMA_FIELD_UPDATED",
            Event::SchemaFieldDeleted => "SCHEMA_FIELD_DELETED",
            Event::SchemaPersistFailed => "SCHEMA_PERSIST_FAILED",
            Event::RecordModelRefreshed => "RECORD_MODEL_REFRESHED",
            Event::HttpRequest => "HTTP_REQUEST",
            Event::AuthRejected => "AUTH_REJECTED",
            Event::ResponseRenderFailed => "RESPONSE_RENDER_FAILED",
        }
    }

    /// Whether this event terminates the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ServerFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
