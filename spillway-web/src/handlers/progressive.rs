//! Progressive media relay.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Response, header};

use super::utils::{extract_range_header, proxy_error_response, relay_response};
use crate::server::AppState;

/// `GET /progressive/{video_id}`: relays the best progressive candidate.
///
/// Honors the inbound `Range` verbatim so players can seek. Exhaustion of
/// the progressive path is the terminal failure of a playback session.
pub async fn relay_progressive(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Response<Body> {
    let range = extract_range_header(&headers);

    match state
        .proxy
        .relay_progressive(&video_id, range.as_deref())
        .await
    {
        Ok(origin) => {
            let mut response = relay_response(origin);
            response.headers_mut().insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("inline"),
            );
            response
        }
        Err(error) => proxy_error_response(&error),
    }
}
