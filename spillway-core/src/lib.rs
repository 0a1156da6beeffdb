//! Spillway Core - relay, playlist rewriting, and playback orchestration

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! This crate provides the building blocks of the streaming proxy: the
//! byte-range-aware origin relay, the playlist rewriter that keeps client
//! traffic same-origin, the adaptive-to-progressive fallback orchestration,
//! and configuration management.

pub mod config;
pub mod manifest;
pub mod proxy;
pub mod relay;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::SpillwayConfig;
pub use manifest::ManifestError;
pub use proxy::{MasterManifest, ProxyError, SegmentRelay, StreamingProxy};
pub use relay::{OriginResponse, RangeForwarder, RelayError};
