//! Master playlist handler: rewritten manifest or progressive fallback.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use spillway_core::manifest::PLAYLIST_CONTENT_TYPE;
use spillway_core::proxy::MasterManifest;
use tracing::debug;

use crate::server::AppState;

/// `GET /manifest/{video_id}`: serves the rewritten master playlist.
///
/// The adaptive path never dead-ends: any failure redirects the player to
/// the progressive endpoint for the same video.
pub async fn serve_master_manifest(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Response<Body> {
    match state.proxy.master_manifest(&video_id).await {
        MasterManifest::Rewritten(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-store"),
            ],
            body,
        )
            .into_response(),
        MasterManifest::FallBack => {
            debug!("redirecting '{video_id}' to progressive delivery");
            Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, format!("/progressive/{video_id}"))
                .body(Body::empty())
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
