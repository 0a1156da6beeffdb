//! End-to-end tests: a live local origin behind the full proxy router.
//!
//! The origin is a real axum server on an ephemeral port serving a master
//! playlist, a media playlist, and a range-capable blob; the proxy runs on
//! another ephemeral port and is driven with a plain HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode, header};
use axum::routing::get;
use spillway_core::config::SpillwayConfig;
use spillway_core::manifest::encode_reference;
use spillway_core::proxy::StreamingProxy;
use spillway_resolve::{DeliveryCandidate, DeliveryKind, SourceResolver, StaticResolver};
use spillway_web::{AppState, router};
use url::Url;

const BLOB_SIZE: usize = 100_000;

fn blob() -> Vec<u8> {
    (0..BLOB_SIZE).map(|i| (i % 251) as u8).collect()
}

async fn serve_blob(headers: HeaderMap) -> Response<Body> {
    let data = blob();
    let total = data.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("bytes="))
        .and_then(|spec| {
            let (start, end) = spec.split_once('-')?;
            let start: usize = start.parse().ok()?;
            let end: usize = if end.is_empty() {
                total - 1
            } else {
                end.parse().ok()?
            };
            (start <= end && end < total).then_some((start, end))
        });

    match range {
        Some((start, end)) => {
            let slice = data[start..=end].to_vec();
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, "video/mp4")
                .header(header::CONTENT_LENGTH, slice.len().to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{total}"),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from(slice))
                .unwrap()
        }
        None => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "video/mp4")
            .header(header::CONTENT_LENGTH, total.to_string())
            .header(header::ACCEPT_RANGES, "bytes")
            .body(Body::from(data))
            .unwrap(),
    }
}

/// Binds a local origin serving a two-variant master playlist, a media
/// playlist, and the blob.
async fn spawn_origin() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let master = format!(
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720\n\
         http://{addr}/media/variant.m3u8\n\
         #EXT-X-STREAM-INF:BANDWIDTH=400000,RESOLUTION=640x480\n\
         media/variant.m3u8\n"
    );
    let variant = format!(
        "#EXTM3U\n\
         #EXT-X-TARGETDURATION:4\n\
         #EXTINF:4.0,\n\
         http://{addr}/media/blob\n\
         #EXT-X-ENDLIST\n"
    );

    let app = Router::new()
        .route(
            "/master.m3u8",
            get(move || {
                let body = master.clone();
                async move {
                    (
                        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
                        body,
                    )
                }
            }),
        )
        .route(
            "/media/variant.m3u8",
            get(move || {
                let body = variant.clone();
                async move {
                    (
                        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
                        body,
                    )
                }
            }),
        )
        .route("/media/blob", get(serve_blob));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Runs the proxy router over the given resolver on an ephemeral port.
async fn spawn_proxy(resolver: Arc<dyn SourceResolver>) -> SocketAddr {
    let config = SpillwayConfig::default();
    let proxy = StreamingProxy::new(&config.proxy, resolver).unwrap();
    let app = router(AppState {
        proxy: Arc::new(proxy),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn adaptive_candidate(origin: SocketAddr) -> DeliveryCandidate {
    DeliveryCandidate {
        kind: DeliveryKind::Adaptive,
        url: format!("http://{origin}/master.m3u8"),
        quality: Some(720),
        container: Some("m3u8".to_string()),
    }
}

fn progressive_candidate(origin: SocketAddr) -> DeliveryCandidate {
    DeliveryCandidate {
        kind: DeliveryKind::Progressive,
        url: format!("http://{origin}/media/blob"),
        quality: Some(480),
        container: Some("mp4".to_string()),
    }
}

#[tokio::test]
async fn test_master_manifest_is_rewritten_in_place() {
    let origin = spawn_origin().await;
    let mut resolver = StaticResolver::new();
    resolver.insert("vid1", vec![adaptive_candidate(origin)]);
    let proxy = spawn_proxy(Arc::new(resolver)).await;

    let response = client()
        .get(format!("http://{proxy}/manifest/vid1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.apple.mpegurl"
    );

    let body = response.text().await.unwrap();
    let lines: Vec<&str> = body.split('\n').collect();

    // Same shape as the origin playlist: tags untouched, references proxied.
    assert_eq!(lines[0], "#EXTM3U");
    assert_eq!(
        lines[2],
        "#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720"
    );
    assert!(lines[3].starts_with("/segment?ref="));
    assert!(lines[5].starts_with("/segment?ref="));
    assert_eq!(lines.len(), 7);
}

#[tokio::test]
async fn test_nested_playlist_is_rewritten_by_segment_relay() {
    let origin = spawn_origin().await;
    let proxy = spawn_proxy(Arc::new(StaticResolver::new())).await;

    let variant = Url::parse(&format!("http://{origin}/media/variant.m3u8")).unwrap();
    let response = client()
        .get(format!("http://{proxy}{}", encode_reference(&variant)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = response.text().await.unwrap();
    assert!(body.contains("#EXTINF:4.0,"));
    assert!(
        body.split('\n').any(|line| line.starts_with("/segment?ref=")),
        "segment reference was not proxied: {body}"
    );
}

#[tokio::test]
async fn test_segment_relay_honors_byte_ranges() {
    let origin = spawn_origin().await;
    let proxy = spawn_proxy(Arc::new(StaticResolver::new())).await;

    let target = Url::parse(&format!("http://{origin}/media/blob")).unwrap();
    let response = client()
        .get(format!("http://{proxy}{}", encode_reference(&target)))
        .header(header::RANGE, "bytes=100-199")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 206);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 100-199/{BLOB_SIZE}")
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), 100);
    assert_eq!(&body[..], &blob()[100..200]);
}

#[tokio::test]
async fn test_manifest_falls_back_deterministically_without_adaptive() {
    let origin = spawn_origin().await;
    let mut resolver = StaticResolver::new();
    resolver.insert("vid2", vec![progressive_candidate(origin)]);
    let proxy = spawn_proxy(Arc::new(resolver)).await;

    for _ in 0..3 {
        let response = client()
            .get(format!("http://{proxy}/manifest/vid2"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 302);
        assert_eq!(response.headers()[header::LOCATION], "/progressive/vid2");
    }
}

#[tokio::test]
async fn test_empty_resolver_is_terminal_but_never_hangs() {
    let proxy = spawn_proxy(Arc::new(StaticResolver::new())).await;

    let manifest = client()
        .get(format!("http://{proxy}/manifest/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(manifest.status(), 302);
    assert_eq!(manifest.headers()[header::LOCATION], "/progressive/ghost");

    let progressive = client()
        .get(format!("http://{proxy}/progressive/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(progressive.status(), 404);
    let body = progressive.text().await.unwrap();
    assert!(body.contains("NoPlayableSource"), "unexpected body: {body}");
}

#[tokio::test]
async fn test_progressive_relay_streams_full_file() {
    let origin = spawn_origin().await;
    let mut resolver = StaticResolver::new();
    resolver.insert("vid3", vec![progressive_candidate(origin)]);
    let proxy = spawn_proxy(Arc::new(resolver)).await;

    let response = client()
        .get(format!("http://{proxy}/progressive/vid3"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");
    assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), BLOB_SIZE);
    assert_eq!(&body[..], &blob()[..]);
}

#[tokio::test]
async fn test_missing_ref_parameter_is_a_client_error() {
    let proxy = spawn_proxy(Arc::new(StaticResolver::new())).await;

    let response = client()
        .get(format!("http://{proxy}/segment"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_unreachable_origin_fails_only_that_relay() {
    let proxy = spawn_proxy(Arc::new(StaticResolver::new())).await;

    // A resolvable-looking reference whose origin refuses connections.
    let dead = Url::parse("http://127.0.0.1:9/segment.ts").unwrap();
    let response = client()
        .get(format!("http://{proxy}{}", encode_reference(&dead)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body = response.text().await.unwrap();
    assert!(body.contains("OriginUnavailable"), "unexpected body: {body}");
}
