//! HTTP server wiring for the streaming proxy.
//!
//! The proxy instance is constructed once at startup with its configuration
//! and handed to every request handler through `AppState`; no globals.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use spillway_core::config::SpillwayConfig;
use spillway_core::proxy::StreamingProxy;
use spillway_resolve::SourceResolver;
use tower_http::cors::CorsLayer;

use crate::handlers::{relay_progressive, relay_segment, serve_master_manifest};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The playback proxy; stateless apart from its outbound budget.
    pub proxy: Arc<StreamingProxy>,
}

/// Builds the HTTP surface for a proxy instance.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/manifest/{video_id}", get(serve_master_manifest))
        .route("/segment", get(relay_segment))
        .route("/progressive/{video_id}", get(relay_progressive))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the proxy server until the listener fails.
///
/// # Errors
/// Returns an error when the relay client cannot be built, the bind address
/// is unavailable, or serving fails.
pub async fn run_server(
    config: SpillwayConfig,
    resolver: Arc<dyn SourceResolver>,
) -> Result<(), Box<dyn std::error::Error>> {
    let proxy = StreamingProxy::new(&config.proxy, resolver)?;
    let state = AppState {
        proxy: Arc::new(proxy),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address).await?;
    tracing::info!(
        "spillway proxy listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
