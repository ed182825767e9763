//! # Content Negotiation
//!
//! Handlers speak JSON only. This middleware sits in front of them:
//! - picks the response format from `Accept`; JSON wins whenever it is
//!   acceptable, XML is used when only XML is
//! - answers 406 before any handler runs when neither is acceptable
//! - converts `text/xml` / `application/xml` request bodies to JSON,
//!   unwrapping the `<root>` element
//! - renders JSON responses as XML when XML was picked

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::observability::{Event, Logger};

use super::response::{ApiError, ApiResult};
use super::xml;

/// Largest request body converted from XML
const MAX_XML_BODY_BYTES: usize = 2 * 1024 * 1024;

const JSON_RANGES: [&str; 5] = ["application/json", "application/*", "*/*", "text/html", "text/*"];
const XML_RANGES: [&str; 2] = ["application/xml", "text/xml"];

/// Response body format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

/// Picks the response format for an `Accept` header.
///
/// A missing or blank header accepts anything. Ranges with `q=0` are refused.
/// Returns `None` when neither JSON nor XML is acceptable.
pub fn preferred_format(accept: Option<&str>) -> Option<Format> {
    let accept = match accept {
        Some(accept) if !accept.trim().is_empty() => accept,
        _ => return Some(Format::Json),
    };

    let ranges: Vec<&str> = accept.split(',').filter_map(acceptable_range).collect();
    let accepts = |candidates: &[&str]| {
        ranges
            .iter()
            .any(|range| candidates.iter().any(|c| range.eq_ignore_ascii_case(c)))
    };

    if accepts(&JSON_RANGES) {
        Some(Format::Json)
    } else if accepts(&XML_RANGES) {
        Some(Format::Xml)
    } else {
        None
    }
}

/// Media type of one `Accept` entry, unless it is empty or has `q=0`.
fn acceptable_range(entry: &str) -> Option<&str> {
    let mut parts = entry.split(';');
    let media = parts.next()?.trim();

    let refused = parts.any(|param| {
        param
            .trim()
            .strip_prefix("q=")
            .and_then(|q| q.trim().parse::<f32>().ok())
            .map_or(false, |q| q <= 0.0)
    });

    if media.is_empty() || refused {
        None
    } else {
        Some(media)
    }
}

fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    value
        .split(';')
        .next()
        .map(|media| media.trim().to_ascii_lowercase())
}

fn has_xml_body(headers: &HeaderMap) -> bool {
    media_type(headers).map_or(false, |media| XML_RANGES.contains(&media.as_str()))
}

fn has_json_body(headers: &HeaderMap) -> bool {
    media_type(headers).map_or(false, |media| media == "application/json")
}

/// Negotiation middleware; see the module docs.
pub async fn negotiate(request: Request, next: Next) -> Response {
    let accept = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());

    let Some(format) = preferred_format(accept) else {
        return ApiError::NotAcceptable.into_response();
    };

    let response = match xml_body_as_json(request).await {
        Ok(request) => next.run(request).await,
        Err(e) => e.into_response(),
    };

    match format {
        Format::Json => response,
        Format::Xml => match render_xml(response).await {
            Ok(response) => response,
            Err(e) => {
                let reason = e.to_string();
                Logger::error(
                    Event::ResponseRenderFailed.as_str(),
                    &[("format", "xml"), ("reason", reason.as_str())],
                );
                e.into_response()
            }
        },
    }
}

/// Replaces an XML request body with the JSON content of its `<root>`.
async fn xml_body_as_json(request: Request) -> ApiResult<Request> {
    if !has_xml_body(request.headers()) {
        return Ok(request);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_XML_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadXml(format!("Failed to read XML body: {}", e)))?;
    if bytes.is_empty() {
        return Ok(Request::from_parts(parts, Body::empty()));
    }

    let text = std::str::from_utf8(&bytes)
        .map_err(|e| ApiError::BadXml(format!("XML body is not UTF-8: {}", e)))?;
    let value = xml::parse_document(text).map_err(|e| ApiError::BadXml(e.to_string()))?;

    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Request::from_parts(parts, Body::from(value.to_string())))
}

/// Re-renders a JSON response body as XML. Other responses pass through.
async fn render_xml(response: Response) -> ApiResult<Response> {
    if !has_json_body(response.headers()) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ApiError::RenderFailed(format!("Failed to read response body: {}", e)))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::RenderFailed(format!("Response body is not JSON: {}", e)))?;
    let document =
        xml::render_document(&value).map_err(|e| ApiError::RenderFailed(e.to_string()))?;

    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(document)))
}
