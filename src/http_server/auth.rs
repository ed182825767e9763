//! HTTP Basic authentication
//!
//! Guards the record and schema routes. A request without valid credentials
//! is answered with 401 before any handler runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::observability::{Event, Logger};

use super::response::ApiError;
use super::server::AppState;

/// Accepted basic-auth credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

fn default_username() -> String {
    "developer".to_string()
}

fn default_password() -> String {
    "awesome".to_string()
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks a raw `Authorization` header value.
    ///
    /// Both parts are always compared, in constant time.
    pub fn verify_header(&self, value: &str) -> bool {
        let Some((user, pass)) = decode_basic(value) else {
            return false;
        };

        let user_ok = user.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = pass.as_bytes().ct_eq(self.password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

/// Splits `Basic <base64(user:pass)>` into its parts. Empty parts are rejected.
fn decode_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;

    if user.is_empty() || pass.is_empty() {
        return None;
    }
    Some((user.to_string(), pass.to_string()))
}

/// Middleware: rejects requests that do not carry the configured credentials.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let reason = match header_value {
        None => "missing credentials",
        Some(value) if state.credentials.verify_header(value) => {
            return next.run(request).await;
        }
        Some(_) => "invalid credentials",
    };

    let method = request.method().to_string();
    Logger::warn(
        Event::AuthRejected.as_str(),
        &[
            ("method", method.as_str()),
            ("path", request.uri().path()),
            ("reason", reason),
        ],
    );

    ApiError::Unauthorized.into_response()
}
