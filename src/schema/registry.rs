//! Schema registry
//!
//! Owns the live schema and is the only path through which it changes.
//!
//! # Mutation pipeline
//!
//! check → validate → copy → mutate one field → persist → promote → refresh
//!
//! - Mutations are serialized through an async mutex; a second mutation waits
//!   for the first to finish before reading the live schema.
//! - The live schema is an immutable snapshot behind an `Arc`. A mutation
//!   builds a complete new document and swaps the pointer only after the store
//!   accepted it, so readers see either the old or the new snapshot.
//! - Each mutation runs on its own task. A caller that stops waiting does not
//!   stop it, so a persisted document is always promoted.
//! - Every promoted snapshot gets the next revision number.
//! - Record models are refreshed before the mutation returns.

use std::future::Future;
use std::ops::Deref;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::observability::{log_event_with_fields, Event, Logger};

use super::errors::{SchemaError, SchemaResult};
use super::store::SchemaStore;
use super::types::SchemaDocument;
use super::validator::FieldValidator;

/// Record-side binding that must follow schema changes.
pub trait RecordModelAdapter: Send + Sync {
    /// Rebuilds the field mapping from `schema`
    fn refresh(&self, schema: &SchemaDocument);
}

/// An immutable, revisioned view of the schema.
#[derive(Debug)]
pub struct SchemaSnapshot {
    revision: u64,
    document: SchemaDocument,
}

impl SchemaSnapshot {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }
}

impl Deref for SchemaSnapshot {
    type Target = SchemaDocument;

    fn deref(&self) -> &SchemaDocument {
        &self.document
    }
}

/// The schema registry.
pub struct SchemaRegistry {
    state: Arc<RegistryState>,
}

struct RegistryState {
    store: Arc<dyn SchemaStore>,
    live: RwLock<Arc<SchemaSnapshot>>,
    mutations: Mutex<()>,
    models: RwLock<Vec<Arc<dyn RecordModelAdapter>>>,
}

impl SchemaRegistry {
    /// Loads the persisted schema and makes it live at revision 1.
    pub fn open(store: Arc<dyn SchemaStore>) -> SchemaResult<Self> {
        let document = store.load()?;

        let field_count = document.fields.len().to_string();
        log_event_with_fields(
            Event::SchemaLoaded,
            &[
                ("fields", field_count.as_str()),
                ("schema", document.schema_name.as_str()),
            ],
        );

        Ok(Self {
            state: Arc::new(RegistryState {
                store,
                live: RwLock::new(Arc::new(SchemaSnapshot {
                    revision: 1,
                    document,
                })),
                mutations: Mutex::new(()),
                models: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Registers a record model. It is refreshed immediately with the live
    /// schema and again after every successful mutation.
    pub fn with_model(self, model: Arc<dyn RecordModelAdapter>) -> Self {
        model.refresh(self.snapshot().document());
        self.state
            .models
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(model);
        self
    }

    /// Returns the live snapshot
    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.state.snapshot()
    }

    /// Revision of the live snapshot
    pub fn revision(&self) -> u64 {
        self.snapshot().revision
    }

    /// Returns the whole live schema. Never fails.
    pub fn get_schema(&self) -> Arc<SchemaSnapshot> {
        self.snapshot()
    }

    /// Returns the whole live schema if `name` is one of its fields.
    ///
    /// Callers pick the field out of the returned document themselves.
    pub fn get_field(&self, name: &str) -> SchemaResult<Arc<SchemaSnapshot>> {
        let snapshot = self.snapshot();
        if snapshot.fields.contains(name) {
            Ok(snapshot)
        } else {
            Err(SchemaError::not_found())
        }
    }

    /// Adds a field.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the name is taken (system fields included)
    /// - `BadInput` if the name or definition is invalid
    /// - `Internal` if persistence fails; the live schema is unchanged
    pub async fn add_field(&self, name: &str, definition: &Value) -> SchemaResult<Arc<SchemaSnapshot>> {
        let state = Arc::clone(&self.state);
        let name = name.to_string();
        let definition = definition.clone();
        detached(async move { state.add_field(&name, &definition).await }).await
    }

    /// Replaces the whole definition of an existing field. Nothing from the
    /// old definition is merged in.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the field does not exist
    /// - `BadInput` if the field is system-level or the definition is invalid
    /// - `Internal` if persistence fails; the live schema is unchanged
    pub async fn update_field(
        &self,
        name: &str,
        definition: &Value,
    ) -> SchemaResult<Arc<SchemaSnapshot>> {
        let state = Arc::clone(&self.state);
        let name = name.to_string();
        let definition = definition.clone();
        detached(async move { state.update_field(&name, &definition).await }).await
    }

    /// Removes a field.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the field does not exist
    /// - `BadInput` if the field is system-level
    /// - `Internal` if persistence fails; the live schema is unchanged
    pub async fn delete_field(&self, name: &str) -> SchemaResult<Arc<SchemaSnapshot>> {
        let state = Arc::clone(&self.state);
        let name = name.to_string();
        detached(async move { state.delete_field(&name).await }).await
    }
}

/// Runs a mutation to completion on its own task.
///
/// Dropping the returned future detaches the task instead of cancelling it.
async fn detached<F>(mutation: F) -> SchemaResult<Arc<SchemaSnapshot>>
where
    F: Future<Output = SchemaResult<Arc<SchemaSnapshot>>> + Send + 'static,
{
    tokio::spawn(mutation)
        .await
        .map_err(|e| SchemaError::internal(format!("Schema mutation task failed: {}", e)))?
}

impl RegistryState {
    fn snapshot(&self) -> Arc<SchemaSnapshot> {
        let live = self.live.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&live)
    }

    async fn add_field(&self, name: &str, definition: &Value) -> SchemaResult<Arc<SchemaSnapshot>> {
        let _guard = self.mutations.lock().await;
        let current = self.snapshot();

        if current.fields.contains(name) {
            return Err(SchemaError::conflict(name));
        }

        FieldValidator::validate_name(name)?;
        let definition = FieldValidator::validate(definition)?;

        let mut next = current.document.clone();
        next.fields.insert(name, definition);

        self.commit(Event::SchemaFieldAdded, name, &current, next).await
    }

    async fn update_field(&self, name: &str, definition: &Value) -> SchemaResult<Arc<SchemaSnapshot>> {
        let _guard = self.mutations.lock().await;
        let current = self.snapshot();

        let existing = current.fields.get(name).ok_or_else(SchemaError::not_found)?;
        if existing.system_level {
            return Err(SchemaError::system_level_immutable(name));
        }

        let definition = FieldValidator::validate(definition)?;

        let mut next = current.document.clone();
        next.fields.insert(name, definition);

        self.commit(Event::SchemaFieldUpdated, name, &current, next).await
    }

    async fn delete_field(&self, name: &str) -> SchemaResult<Arc<SchemaSnapshot>> {
        let _guard = self.mutations.lock().await;
        let current = self.snapshot();

        let existing = current.fields.get(name).ok_or_else(SchemaError::not_found)?;
        if existing.system_level {
            return Err(SchemaError::system_level_immutable(name));
        }

        let mut next = current.document.clone();
        next.fields.remove(name);

        self.commit(Event::SchemaFieldDeleted, name, &current, next).await
    }

    /// Persists `next`, then promotes it and refreshes models.
    ///
    /// Must be called with the mutation lock held.
    async fn commit(
        &self,
        event: Event,
        field: &str,
        current: &SchemaSnapshot,
        next: SchemaDocument,
    ) -> SchemaResult<Arc<SchemaSnapshot>> {
        let store = Arc::clone(&self.store);
        let persisted = tokio::task::spawn_blocking(move || store.save(&next).map(|()| next))
            .await
            .map_err(|e| SchemaError::internal(format!("Schema persistence task failed: {}", e)))
            .and_then(|result| result);

        let next = match persisted {
            Ok(next) => next,
            Err(e) => {
                let revision = current.revision.to_string();
                Logger::error(
                    Event::SchemaPersistFailed.as_str(),
                    &[
                        ("field", field),
                        ("reason", e.message()),
                        ("revision", revision.as_str()),
                    ],
                );
                return Err(e);
            }
        };

        let snapshot = Arc::new(SchemaSnapshot {
            revision: current.revision + 1,
            document: next,
        });

        {
            let mut live = self.live.write().unwrap_or_else(|e| e.into_inner());
            *live = Arc::clone(&snapshot);
        }

        {
            let models = self.models.read().unwrap_or_else(|e| e.into_inner());
            for model in models.iter() {
                model.refresh(snapshot.document());
            }
        }

        let revision = snapshot.revision.to_string();
        log_event_with_fields(
            event,
            &[
                ("field", field),
                ("revision", revision.as_str()),
                ("schema", snapshot.schema_name.as_str()),
            ],
        );

        Ok(snapshot)
    }
}
