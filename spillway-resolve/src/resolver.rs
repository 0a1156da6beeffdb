//! The resolution seam and the map-backed resolver used in development.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::errors::ResolveError;
use crate::types::DeliveryCandidate;

/// Trait for per-video delivery-URL resolvers.
///
/// Implementations answer "how can this video be fetched right now": zero or
/// more candidate URLs, each annotated with quality metadata. An empty answer
/// is a normal outcome, not an error.
#[async_trait]
pub trait SourceResolver: Send + Sync + fmt::Debug {
    /// Resolves a video identifier to its current delivery candidates.
    ///
    /// # Errors
    /// - `ResolveError::NetworkError` - origin platform unreachable
    /// - `ResolveError::FormatChanged` - origin response no longer parseable
    /// - `ResolveError::Unavailable` - video removed or blocked
    async fn resolve(&self, video_id: &str) -> Result<Vec<DeliveryCandidate>, ResolveError>;
}

/// Map-backed resolver for development and tests.
///
/// Candidates are keyed by video id, either inserted directly or loaded from
/// a JSON source map of the form `{"<video_id>": [<candidate>, ...]}`.
/// Unknown ids resolve to the empty candidate list, which is exactly what a
/// real resolver reports for a video it cannot serve.
#[derive(Debug, Default)]
pub struct StaticResolver {
    sources: HashMap<String, Vec<DeliveryCandidate>>,
}

impl StaticResolver {
    /// Creates an empty resolver; every lookup yields no candidates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers candidates for a video id, replacing any previous entry.
    pub fn insert(&mut self, video_id: impl Into<String>, candidates: Vec<DeliveryCandidate>) {
        self.sources.insert(video_id.into(), candidates);
    }

    /// Parses a source map from JSON text.
    ///
    /// # Errors
    /// - `ResolveError::InvalidSourceMap` - the text is not a valid source map
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        let sources = serde_json::from_str(json).map_err(|e| ResolveError::InvalidSourceMap {
            reason: e.to_string(),
        })?;
        Ok(Self { sources })
    }

    /// Loads a source map from a JSON file.
    ///
    /// # Errors
    /// - `ResolveError::InvalidSourceMap` - the file is unreadable or invalid
    pub fn from_json_file(path: &Path) -> Result<Self, ResolveError> {
        let json = std::fs::read_to_string(path).map_err(|e| ResolveError::InvalidSourceMap {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl SourceResolver for StaticResolver {
    async fn resolve(&self, video_id: &str) -> Result<Vec<DeliveryCandidate>, ResolveError> {
        Ok(self.sources.get(video_id).cloned().unwrap_or_default())
    }
}
