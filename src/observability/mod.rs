//! Observability for dynaschema
//!
//! Structured JSON-lines logging, one line per event.
//!
//! ```ignore
//! use dynaschema::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::info("SCHEMA_LOADED", &[("schema", "finance")]);
//! log_event_with_fields(Event::ServerStarted, &[("port", "8080")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
