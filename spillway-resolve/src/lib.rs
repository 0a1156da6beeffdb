//! Spillway Resolve - delivery source resolution

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Defines the seam between the streaming proxy and whatever actually knows
//! how to turn a video identifier into delivery URLs. The proxy only ever
//! consumes the [`SourceResolver`] trait; real resolvers (platform scrapers,
//! extractor sidecars) live outside this workspace.

pub mod errors;
pub mod resolver;
pub mod types;

// Re-export main types
pub use errors::ResolveError;
pub use resolver::{SourceResolver, StaticResolver};
pub use types::{DeliveryCandidate, DeliveryKind};

/// Convenience type alias for Results with ResolveError.
pub type Result<T> = std::result::Result<T, ResolveError>;
