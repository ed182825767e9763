//! # HTTP Server
//!
//! Combines the schema and record routers into one axum application.
//!
//! Layer order, outermost first: CORS, request logging, content negotiation,
//! basic auth (record and schema routes only), handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::records::{RecordProjector, RecordRepository, SchemaBoundModel};
use crate::schema::SchemaRegistry;

use super::auth::{require_basic_auth, Credentials};
use super::config::HttpServerConfig;
use super::negotiate::negotiate;
use super::record_routes::record_routes;
use super::response::{ApiError, SCHEMA_BASE_PATH};
use super::schema_routes::schema_routes;

/// State shared by every handler
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub model: Arc<SchemaBoundModel>,
    pub repository: Arc<dyn RecordRepository>,
    pub projector: RecordProjector,
    pub credentials: Credentials,
}

impl AppState {
    /// Wires the state for the resource `model` is bound to.
    ///
    /// `registry` must already refresh `model`; see `SchemaRegistry::with_model`.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        model: Arc<SchemaBoundModel>,
        repository: Arc<dyn RecordRepository>,
        credentials: Credentials,
    ) -> Self {
        let projector = RecordProjector::new(*model.resource());
        Self {
            registry,
            model,
            repository,
            projector,
            credentials,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "schemaRevision")]
    pub schema_revision: u64,
}

/// HTTP Server for the schema and record services
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let base_path = state.model.resource().base_path;

        let protected = Router::new()
            .nest(SCHEMA_BASE_PATH, schema_routes())
            .nest(base_path, record_routes())
            .route_layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                require_basic_auth,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .merge(protected)
            .fallback(route_not_found)
            .layer(middleware::from_fn(negotiate))
            .layer(middleware::from_fn(log_request))
            .layer(Self::cors_layer(config))
            .with_state(state)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        log_event_with_fields(Event::ServerStarted, &[("addr", bound.as_str())]);

        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_revision: state.registry.revision(),
    })
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Logs one `HTTP_REQUEST` line per request.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let duration_ms = started.elapsed().as_millis().to_string();
    Logger::info(
        Event::HttpRequest.as_str(),
        &[
            ("duration_ms", duration_ms.as_str()),
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("status", status.as_str()),
        ],
    );

    response
}
