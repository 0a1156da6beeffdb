//! Error types for source resolution.

use thiserror::Error;

/// Errors that can occur while resolving a video to delivery candidates.
///
/// The proxy treats every resolution failure like the empty-candidate case
/// and moves on to its fallback policy; these variants exist so failures can
/// be logged with enough context to be diagnosed.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Resolution failed for the specified video and reason.
    #[error("resolution failed for video '{video_id}': {reason}")]
    ResolutionFailed {
        /// The video identifier that failed to resolve
        video_id: String,
        /// The reason for the failure
        reason: String,
    },

    /// Network communication with the origin platform failed.
    #[error("network error: {reason}")]
    NetworkError {
        /// The reason for the network error
        reason: String,
    },

    /// The origin answered in a shape the resolver no longer understands.
    #[error("unexpected origin response: {reason}")]
    FormatChanged {
        /// What the resolver could not parse
        reason: String,
    },

    /// The video is unavailable (removed, private, or region-blocked).
    #[error("video '{video_id}' is unavailable")]
    Unavailable {
        /// The unavailable video identifier
        video_id: String,
    },

    /// A static source map could not be read or parsed.
    #[error("invalid source map: {reason}")]
    InvalidSourceMap {
        /// The reason the source map was rejected
        reason: String,
    },
}
