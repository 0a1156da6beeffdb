//! Candidate data model produced by source resolution.

use serde::{Deserialize, Serialize};

/// How a delivery URL serves its media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// Multi-variant playlist delivery; the player switches bitrate mid-stream.
    Adaptive,
    /// A single combined audio+video file, played by direct byte-range access.
    Progressive,
}

/// One way to fetch a video from its origin platform, as observed by a
/// resolver at resolution time.
///
/// Candidate URLs are typically session-bound and expire; they are resolved
/// fresh for every playback attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCandidate {
    /// Delivery mechanism this URL speaks.
    pub kind: DeliveryKind,
    /// Absolute origin URL.
    pub url: String,
    /// Vertical resolution in pixels, when the resolver could determine it.
    #[serde(default)]
    pub quality: Option<u32>,
    /// Container tag reported by the resolver ("mp4", "m3u8", "webm", ...).
    #[serde(default)]
    pub container: Option<String>,
}

impl DeliveryCandidate {
    /// Whether this candidate is a combined audio+video file a player can
    /// consume directly, without a streaming engine in front of it.
    pub fn is_directly_playable(&self) -> bool {
        self.container.as_deref() == Some("mp4")
    }
}
