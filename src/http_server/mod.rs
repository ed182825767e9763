//! # HTTP Server Module
//!
//! axum boundary for the schema registry and the record service.
//!
//! # Endpoints
//!
//! - `/health` - Health check (no auth)
//! - `/spi/v1/schema/*` - Schema field management
//! - `/api/v1/finances/*` or `/api/v1/k12/*` - Records of the served resource
//!
//! Everything except `/health` requires HTTP Basic credentials. Every
//! endpoint answers in JSON or XML depending on `Accept`.

mod auth;
pub mod config;
mod negotiate;
mod record_routes;
pub mod response;
mod schema_routes;
mod server;
pub mod xml;

pub use auth::Credentials;
pub use config::{HttpServerConfig, PORT_ENV};
pub use response::{status_for_symbol, ApiError, ApiResult};
pub use server::{AppState, HealthResponse, HttpServer};
