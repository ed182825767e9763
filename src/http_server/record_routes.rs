//! Record HTTP Routes
//!
//! CRUD for the served resource, mounted at its base path
//! (`/api/v1/finances` or `/api/v1/k12`). Every response is projected through
//! the schema that is live when the response is built.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::records::{Envelope, RecordError, RecordRepository, RecordResult};

use super::response::ApiResult;
use super::schema_routes::json_body;
use super::server::AppState;

/// Create record routes
pub fn record_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route(
            "/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
}

/// Runs a repository call on the blocking pool.
async fn with_repository<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn RecordRepository) -> RecordResult<T> + Send + 'static,
{
    let repository = Arc::clone(&state.repository);
    let result = tokio::task::spawn_blocking(move || op(repository.as_ref()))
        .await
        .map_err(|e| RecordError::Storage(format!("Record storage task failed: {}", e)))?;
    Ok(result?)
}

fn render(state: &AppState, record: &Value) -> Envelope {
    let schema = state.registry.get_schema();
    state.projector.project(Some(record), &schema)
}

async fn list_records(State(state): State<Arc<AppState>>) -> ApiResult<Json<Envelope>> {
    let records = with_repository(&state, |repo| repo.find_all()).await?;
    let schema = state.registry.get_schema();
    Ok(Json(state.projector.project_collection(&records, &schema)))
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope>> {
    let record = with_repository(&state, move |repo| repo.find(&id))
        .await?
        .ok_or(RecordError::NotFound)?;
    Ok(Json(render(&state, &record)))
}

async fn create_record(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope>)> {
    let record = state.model.prepare_create(json_body(body)?)?;

    let stored = record.clone();
    with_repository(&state, move |repo| repo.insert(stored)).await?;

    Ok((StatusCode::CREATED, Json(render(&state, &record))))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Envelope>> {
    let body = json_body(body)?;

    let lookup = id.clone();
    let existing = with_repository(&state, move |repo| repo.find(&lookup))
        .await?
        .ok_or(RecordError::NotFound)?;

    let record = state.model.prepare_update(&id, &existing, body)?;

    let stored = record.clone();
    with_repository(&state, move |repo| repo.replace(&id, stored)).await?;

    Ok(Json(render(&state, &record)))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    with_repository(&state, move |repo| repo.remove(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
