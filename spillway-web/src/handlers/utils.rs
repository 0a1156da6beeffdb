//! Shared request parsing and response building for the relay handlers.

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode, header};
use axum::response::IntoResponse;
use spillway_core::proxy::ProxyError;
use spillway_core::relay::OriginResponse;

/// Extracts the inbound `Range` header value, if any.
pub fn extract_range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|range| range.to_str().ok())
        .map(|s| s.to_string())
}

/// Extracts a query parameter from the raw query string without decoding it.
///
/// Proxied references are percent-decoded exactly once, by
/// `spillway_core::manifest::decode_reference`; going through a decoding
/// extractor here would corrupt references that contain encoded delimiters.
pub fn raw_query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Builds the client response for a relayed origin body.
///
/// Mirrors the origin status and the captured header subset, marks the
/// response uncacheable (origin URLs are session-bound), and streams the
/// body through without buffering.
pub fn relay_response(origin: OriginResponse) -> Response<Body> {
    let status =
        StatusCode::from_u16(origin.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = origin.headers().clone();

    let mut response = Response::builder()
        .status(status)
        .header(header::CACHE_CONTROL, "no-store");
    if let Some(content_type) = headers.content_type {
        response = response.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(content_length) = headers.content_length {
        response = response.header(header::CONTENT_LENGTH, content_length);
    }
    if let Some(content_range) = headers.content_range {
        response = response.header(header::CONTENT_RANGE, content_range);
    }
    if let Some(accept_ranges) = headers.accept_ranges {
        response = response.header(header::ACCEPT_RANGES, accept_ranges);
    }

    response
        .body(Body::from_stream(origin.into_byte_stream()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Maps proxy failures onto stable, documented error responses.
pub fn proxy_error_response(error: &ProxyError) -> Response<Body> {
    let (status, code) = match error {
        ProxyError::NoPlayableSource { .. } => (StatusCode::NOT_FOUND, "NoPlayableSource"),
        ProxyError::OriginUnavailable(_) => (StatusCode::BAD_GATEWAY, "OriginUnavailable"),
        ProxyError::BadReference(_) => (StatusCode::BAD_REQUEST, "BadReference"),
    };
    let body = serde_json::json!({
        "error": code,
        "detail": error.to_string(),
    });
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}
