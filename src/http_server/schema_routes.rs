//! Schema HTTP Routes
//!
//! Field management for the live schema, mounted at `/spi/v1/schema`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::schema::{SchemaError, SchemaSnapshot};

use super::response::{field_envelope, schema_envelope, ApiError, ApiResult};
use super::server::AppState;

/// Create schema routes
pub fn schema_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_schema))
        .route("/fields", get(get_schema))
        .route(
            "/fields/:name",
            get(get_field)
                .post(add_field)
                .put(update_field)
                .delete(delete_field),
        )
}

/// Unwraps a JSON body, turning a rejection into a 400 envelope.
pub(super) fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadJson(rejection.body_text()))
}

fn render_field(snapshot: &SchemaSnapshot, name: &str) -> ApiResult<Value> {
    let definition = snapshot.field(name).ok_or_else(SchemaError::not_found)?;
    Ok(field_envelope(name, definition))
}

async fn get_schema(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.registry.get_schema();
    Json(schema_envelope(&snapshot))
}

async fn get_field(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let snapshot = state.registry.get_field(&name)?;
    Ok(Json(render_field(&snapshot, &name)?))
}

async fn add_field(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let definition = json_body(body)?;
    let snapshot = state.registry.add_field(&name, &definition).await?;
    Ok((StatusCode::CREATED, Json(render_field(&snapshot, &name)?)))
}

async fn update_field(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let definition = json_body(body)?;
    let snapshot = state.registry.update_field(&name, &definition).await?;
    Ok(Json(render_field(&snapshot, &name)?))
}

async fn delete_field(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete_field(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
