//! CLI command implementations
//!
//! `init` seeds the schema file once. `serve` loads it, wires the registry,
//! record model, repository and HTTP server, and runs until the server stops.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http_server::{AppState, Credentials, HttpServer, HttpServerConfig, PORT_ENV};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::records::{
    InMemoryRecordRepository, JsonFileRecordRepository, RecordRepository, ResourceKind,
    SchemaBoundModel,
};
use crate::schema::{seed_document, FileSchemaStore, SchemaRegistry};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Where records live while serving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStorage {
    /// Lost on restart
    Memory,
    /// `<data_dir>/<collectionName>.json`
    #[default]
    File,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Served resource (default: finance)
    #[serde(default = "default_resource")]
    pub resource: ResourceKind,

    #[serde(default)]
    pub http: HttpServerConfig,

    /// Basic-auth credentials (default: developer / awesome)
    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub record_storage: RecordStorage,

    /// Minimum log severity (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_resource() -> ResourceKind {
    ResourceKind::Finance
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.credentials.username.is_empty() || self.credentials.password.is_empty() {
            return Err(CliError::config_error(
                "credentials.username and credentials.password must not be empty",
            ));
        }

        Ok(())
    }

    /// Applies a `PORT` value taken from the environment.
    pub fn with_port_override(mut self, port: Option<&str>) -> CliResult<Self> {
        self.http.override_port(port).map_err(CliError::config_error)?;
        Ok(self)
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// `<data_dir>/schema/<resource>Schema.json`
    pub fn schema_path(&self, kind: ResourceKind) -> PathBuf {
        self.data_path()
            .join("schema")
            .join(format!("{}Schema.json", kind.descriptor().name))
    }
}

/// Run a CLI command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config, resource } => init(&config, resource),
        Command::Serve { config } => serve(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let port = std::env::var(PORT_ENV).ok();
    let config = Config::load(config_path)?.with_port_override(port.as_deref())?;
    Logger::set_min_severity(config.log_level);

    let path = config_path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("path", path.as_str()),
            ("resource", config.resource.descriptor().name),
        ],
    );
    Ok(config)
}

/// Writes the seed schema of `resource` (or the configured one).
///
/// Fails if the schema file already exists.
pub fn init(config_path: &Path, resource: Option<ResourceKind>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let kind = resource.unwrap_or(config.resource);
    init_schema(&config, kind)?;
    Ok(())
}

/// Seeds the schema file for `kind` and returns its path.
pub fn init_schema(config: &Config, kind: ResourceKind) -> CliResult<PathBuf> {
    let schema_path = config.schema_path(kind);
    let display = schema_path.display().to_string();

    if schema_path.exists() {
        return Err(CliError::already_initialized(&display));
    }

    if let Some(parent) = schema_path.parent() {
        fs::create_dir_all(parent)?;
    }

    FileSchemaStore::new(&schema_path).create(&seed_document(kind))?;

    log_event_with_fields(
        Event::SchemaInitialized,
        &[("path", display.as_str()), ("resource", kind.descriptor().name)],
    );
    Ok(schema_path)
}

/// Builds the HTTP server for `config`. Does not bind.
pub fn build_server(config: &Config) -> CliResult<HttpServer> {
    let resource = config.resource.descriptor();
    let schema_path = config.schema_path(config.resource);
    if !schema_path.exists() {
        return Err(CliError::not_initialized(&schema_path.display().to_string()));
    }

    let store = Arc::new(FileSchemaStore::new(schema_path));
    let model = Arc::new(SchemaBoundModel::new(resource));
    let registry = SchemaRegistry::open(store)?.with_model(model.clone());

    let repository: Arc<dyn RecordRepository> = match config.record_storage {
        RecordStorage::Memory => Arc::new(InMemoryRecordRepository::new(resource.id_field)),
        RecordStorage::File => {
            let path = config
                .data_path()
                .join(format!("{}.json", registry.get_schema().collection_name));
            Arc::new(JsonFileRecordRepository::open(path, resource.id_field)?)
        }
    };

    let state = AppState::new(
        Arc::new(registry),
        model,
        repository,
        config.credentials.clone(),
    );
    Ok(HttpServer::new(config.http.clone(), Arc::new(state)))
}

/// Serve until the listener fails
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let server = build_server(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.start()).map_err(|e| {
        let reason = e.to_string();
        log_event_with_fields(Event::ServerFailed, &[("reason", reason.as_str())]);
        CliError::serve_failed(reason)
    })
}
