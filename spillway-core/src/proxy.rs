//! Playback orchestration and the adaptive-to-progressive fallback policy.
//!
//! A `StreamingProxy` is constructed once at startup and shared across
//! requests; it holds no per-session state. Each operation rebuilds what it
//! needs from the request parameters, so identical resolver output always
//! produces identical behavior.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use spillway_resolve::{DeliveryCandidate, DeliveryKind, SourceResolver};

use crate::config::ProxyConfig;
use crate::manifest::{self, ManifestError};
use crate::relay::{OriginResponse, RangeForwarder, RelayError};

/// Proxy-level failures surfaced to the HTTP layer.
///
/// Failures on the adaptive path never appear here; they are absorbed into
/// the fallback decision. What remains is what the client must be told
/// about.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Neither adaptive nor progressive delivery produced a usable source.
    #[error("no playable source for video '{video_id}'")]
    NoPlayableSource {
        /// The exhausted video identifier
        video_id: String,
    },

    /// The resolved origin could not be reached or timed out.
    #[error(transparent)]
    OriginUnavailable(#[from] RelayError),

    /// The client supplied an unusable proxied reference.
    #[error(transparent)]
    BadReference(#[from] ManifestError),
}

/// Result of a master-playlist request.
#[derive(Debug, PartialEq, Eq)]
pub enum MasterManifest {
    /// Rewritten playlist text, ready to serve.
    Rewritten(String),
    /// The adaptive path is unavailable; send the player to progressive
    /// delivery instead.
    FallBack,
}

/// Result of relaying one proxied reference.
#[derive(Debug)]
pub enum SegmentRelay {
    /// The target was itself a playlist: rewritten text plus the origin
    /// status, so nested references stay same-origin.
    Playlist {
        /// Mirrored origin status
        status: StatusCode,
        /// Rewritten playlist body
        body: String,
    },
    /// A media payload to stream through unchanged.
    Media(OriginResponse),
}

/// Stateless playback proxy.
///
/// Orchestrates resolution, playlist rewriting, and byte relay, and owns
/// the adaptive-to-progressive fallback policy: never dead-end on the adaptive
/// path, surface failure only when every path is exhausted.
#[derive(Debug)]
pub struct StreamingProxy {
    resolver: Arc<dyn SourceResolver>,
    forwarder: RangeForwarder,
}

impl StreamingProxy {
    /// Builds a proxy around a resolver and the configured relay budget.
    ///
    /// # Errors
    /// - `RelayError::ClientSetup` - the outbound HTTP client could not be built
    pub fn new(
        config: &ProxyConfig,
        resolver: Arc<dyn SourceResolver>,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            resolver,
            forwarder: RangeForwarder::new(config)?,
        })
    }

    /// Serves the rewritten master playlist, or decides to fall back.
    ///
    /// Every failure on the adaptive path (no candidate, resolver error,
    /// origin error status, fetch failure, malformed playlist) becomes
    /// [`MasterManifest::FallBack`]; this operation never hard-fails.
    pub async fn master_manifest(&self, video_id: &str) -> MasterManifest {
        let candidates = self.resolve(video_id).await;
        let Some(candidate) = select_adaptive(&candidates) else {
            info!("no adaptive candidate for '{video_id}', falling back to progressive");
            return MasterManifest::FallBack;
        };
        let Ok(source) = Url::parse(&candidate.url) else {
            warn!(
                "unparseable adaptive url for '{video_id}': {}, falling back",
                candidate.url
            );
            return MasterManifest::FallBack;
        };

        let response = match self.forwarder.fetch(&source, None).await {
            Ok(response) => response,
            Err(error) => {
                warn!("master playlist fetch failed for '{video_id}': {error}, falling back");
                return MasterManifest::FallBack;
            }
        };
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            info!("master playlist origin returned {status} for '{video_id}', falling back");
            return MasterManifest::FallBack;
        }

        let base = response.url().clone();
        let body = match response.into_text().await {
            Ok(body) => body,
            Err(error) => {
                warn!("master playlist read failed for '{video_id}': {error}, falling back");
                return MasterManifest::FallBack;
            }
        };
        if let Err(error) = manifest::validate(&body) {
            warn!("malformed master playlist for '{video_id}': {error}, falling back");
            return MasterManifest::FallBack;
        }

        debug!(
            "serving rewritten master playlist for '{video_id}' (quality {:?})",
            candidate.quality
        );
        MasterManifest::Rewritten(manifest::rewrite(&body, &base))
    }

    /// Relays one proxied reference, rewriting nested playlists.
    ///
    /// # Errors
    /// - `ProxyError::BadReference` - the reference did not decode
    /// - `ProxyError::OriginUnavailable` - the target was unreachable
    pub async fn relay_reference(
        &self,
        reference: &str,
        range: Option<&str>,
    ) -> Result<SegmentRelay, ProxyError> {
        let target = manifest::decode_reference(reference)?;
        let response = self.forwarder.fetch(&target, range).await?;

        if response.status().is_success()
            && manifest::is_playlist_target(&target, response.content_type())
        {
            let status = response.status();
            let base = response.url().clone();
            let body = response.into_text().await?;
            // A target that claimed to be a playlist but is not one is
            // mirrored untouched, like any other payload.
            let body = if manifest::validate(&body).is_ok() {
                manifest::rewrite(&body, &base)
            } else {
                body
            };
            return Ok(SegmentRelay::Playlist { status, body });
        }

        Ok(SegmentRelay::Media(response))
    }

    /// Relays the best progressive candidate for a video.
    ///
    /// # Errors
    /// - `ProxyError::NoPlayableSource` - no progressive candidate survived;
    ///   both delivery paths are exhausted
    /// - `ProxyError::OriginUnavailable` - the resolved origin was unreachable
    pub async fn relay_progressive(
        &self,
        video_id: &str,
        range: Option<&str>,
    ) -> Result<OriginResponse, ProxyError> {
        let candidates = self.resolve(video_id).await;
        let Some(candidate) = select_progressive(&candidates) else {
            warn!(
                "no playable source for '{video_id}': adaptive and progressive paths exhausted"
            );
            return Err(ProxyError::NoPlayableSource {
                video_id: video_id.to_string(),
            });
        };
        let Ok(target) = Url::parse(&candidate.url) else {
            warn!(
                "unparseable progressive url for '{video_id}': {}",
                candidate.url
            );
            return Err(ProxyError::NoPlayableSource {
                video_id: video_id.to_string(),
            });
        };

        debug!(
            "relaying progressive delivery for '{video_id}' (quality {:?}, range {range:?})",
            candidate.quality
        );
        Ok(self.forwarder.fetch(&target, range).await?)
    }

    /// Resolution with the collaborator-failure policy applied: a resolver
    /// error is the empty-candidate case, not a hard failure.
    async fn resolve(&self, video_id: &str) -> Vec<DeliveryCandidate> {
        match self.resolver.resolve(video_id).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!("resolution failed for '{video_id}': {error}");
                Vec::new()
            }
        }
    }
}

/// Picks the adaptive candidate to serve.
///
/// Highest quality wins; a missing quality sorts lowest; equal qualities
/// keep the earliest candidate. A pure function of the candidate list.
pub fn select_adaptive(candidates: &[DeliveryCandidate]) -> Option<&DeliveryCandidate> {
    best_quality(
        candidates
            .iter()
            .filter(|candidate| candidate.kind == DeliveryKind::Adaptive),
    )
}

/// Picks the progressive candidate to serve.
///
/// Highest quality among directly-playable containers; if none qualify,
/// highest quality among all progressive candidates rather than failing.
pub fn select_progressive(candidates: &[DeliveryCandidate]) -> Option<&DeliveryCandidate> {
    let progressive = || {
        candidates
            .iter()
            .filter(|candidate| candidate.kind == DeliveryKind::Progressive)
    };
    best_quality(progressive().filter(|candidate| candidate.is_directly_playable()))
        .or_else(|| best_quality(progressive()))
}

fn best_quality<'a>(
    candidates: impl Iterator<Item = &'a DeliveryCandidate>,
) -> Option<&'a DeliveryCandidate> {
    candidates.fold(None, |best, candidate| match best {
        Some(current) if quality_of(current) >= quality_of(candidate) => Some(current),
        _ => Some(candidate),
    })
}

fn quality_of(candidate: &DeliveryCandidate) -> u32 {
    candidate.quality.unwrap_or(0)
}
