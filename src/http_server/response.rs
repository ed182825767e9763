//! # HTTP Responses
//!
//! Envelopes and the error type shared by every handler.
//!
//! Registry and repository errors travel up unchanged; this is the only place
//! where their symbolic status becomes an HTTP status code.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::records::RecordError;
use crate::schema::{FieldDefinition, SchemaDocument, SchemaError};

/// Base path of the schema service
pub const SCHEMA_BASE_PATH: &str = "/spi/v1/schema";

const REALM: &str = "Basic realm=Authorization Required";

/// Maps a symbolic status to an HTTP status code.
///
/// Numeric strings pass through unchanged; anything unrecognized is 500.
pub fn status_for_symbol(symbol: &str) -> u16 {
    if let Ok(numeric) = symbol.parse::<u16>() {
        return numeric;
    }

    match symbol {
        "SCHEMA_ERROR_RESOURCE_NOT_FOUND" => 404,
        "SCHEMA_ERROR_RESOURCE_CONFLICT" => 409,
        "SCHEMA_ERROR_UNAUTHORIZED" => 401,
        "SCHEMA_ERROR_VALIDATION_CHECK_FAILED" => 400,
        "SCHEMA_ERROR_BAD_INPUT_REQUEST" => 400,
        "SCHEMA_ERROR_FORBIDDEN" => 403,
        "SCHEMA_ERROR_INTERNAL_ERROR" => 500,
        "DB_ERROR_RESOURCE_NOT_FOUND" => 404,
        "DB_ERROR_RESOURCE_CONFLICT" => 409,
        "DB_ERROR_BAD_INPUT_REQUEST" => 400,
        "DB_ERROR_INTERNAL_ERROR" => 500,
        "HTTP_ERROR_ROUTE_NOT_FOUND" => 404,
        "HTTP_ERROR_BAD_REQUEST_BODY" => 400,
        "HTTP_ERROR_NOT_ACCEPTABLE" => 406,
        "HTTP_ERROR_INTERNAL_ERROR" => 500,
        _ => 500,
    }
}

/// `{resourceType:"error", errors:[{version, status, code, message}]}`
///
/// `code` is the symbolic kind, so errors sharing a status stay distinguishable.
pub fn error_envelope(status: u16, code: &str, message: &str) -> Value {
    json!({
        "resourceType": "error",
        "errors": [{
            "version": "v1",
            "status": status,
            "code": code,
            "message": message,
        }]
    })
}

/// Field envelope with a self link.
pub fn field_envelope(name: &str, definition: &FieldDefinition) -> Value {
    json!({
        "resourceType": "field",
        "data": {
            "fieldName": name,
            "type": definition.field_type,
            "hidden": definition.hidden,
            "required": definition.required,
            "systemLevel": definition.system_level,
        },
        "link": {
            "rel": "self",
            "href": format!("{}/fields/{}", SCHEMA_BASE_PATH, name),
        }
    })
}

/// Schema envelope. Fields are listed in schema order.
pub fn schema_envelope(schema: &SchemaDocument) -> Value {
    let fields: Vec<Value> = schema
        .fields
        .iter()
        .map(|(name, definition)| field_envelope(name, definition))
        .collect();

    json!({
        "resourceType": "schema",
        "data": {
            "schemaName": schema.schema_name,
            "collectionName": schema.collection_name,
            "historyCollectionName": schema.history_collection_name,
            "version": schema.version,
            "fields": fields,
        },
        "link": {
            "rel": "self",
            "href": format!("{}/fields", SCHEMA_BASE_PATH),
        }
    })
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors rendered as the error envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.message())]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Record(#[from] RecordError),

    /// Missing or wrong basic-auth credentials
    #[error("User is not authorized")]
    Unauthorized,

    /// No route matched
    #[error("404: URL Not Found")]
    RouteNotFound,

    /// Body is not valid JSON
    #[error("{0}")]
    BadJson(String),

    /// Body is not a valid XML document
    #[error("{0}")]
    BadXml(String),

    /// The client accepts neither JSON nor XML
    #[error("Not acceptable")]
    NotAcceptable,

    /// A response could not be rendered in the negotiated format
    #[error("{0}")]
    RenderFailed(String),
}

impl ApiError {
    /// Symbolic kind carried in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Schema(e) => e.code(),
            ApiError::Record(e) => e.code(),
            ApiError::Unauthorized => "SCHEMA_ERROR_UNAUTHORIZED",
            ApiError::RouteNotFound => "HTTP_ERROR_ROUTE_NOT_FOUND",
            ApiError::BadJson(_) | ApiError::BadXml(_) => "HTTP_ERROR_BAD_REQUEST_BODY",
            ApiError::NotAcceptable => "HTTP_ERROR_NOT_ACCEPTABLE",
            ApiError::RenderFailed(_) => "HTTP_ERROR_INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(status_for_symbol(self.code()))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(error_envelope(status.as_u16(), self.code(), &self.to_string()));

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
        }
        response
    }
}
