//! Proxied-reference relay: sub-playlists and media segments.

use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, Response, StatusCode, header};
use axum::response::IntoResponse;
use spillway_core::manifest::PLAYLIST_CONTENT_TYPE;
use spillway_core::proxy::SegmentRelay;

use super::utils::{extract_range_header, proxy_error_response, raw_query_param, relay_response};
use crate::server::AppState;

/// `GET /segment?ref=<proxied reference>`: relays one origin resource.
///
/// Honors the inbound `Range` verbatim. Targets that are themselves
/// playlists are rewritten again so nested references stay same-origin.
pub async fn relay_segment(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response<Body> {
    let query = query.unwrap_or_default();
    let Some(reference) = raw_query_param(&query, "ref") else {
        return (StatusCode::BAD_REQUEST, "missing ref parameter").into_response();
    };
    let range = extract_range_header(&headers);

    match state.proxy.relay_reference(reference, range.as_deref()).await {
        Ok(SegmentRelay::Playlist { status, body }) => {
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK);
            (
                status,
                [
                    (header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE),
                    (header::CACHE_CONTROL, "no-store"),
                ],
                body,
            )
                .into_response()
        }
        Ok(SegmentRelay::Media(origin)) => relay_response(origin),
        Err(error) => proxy_error_response(&error),
    }
}
