//! Spillway Web - HTTP streaming surface

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Serves the three proxy routes (master playlist, segment relay,
//! progressive relay) around a stateless proxy instance. All client
//! traffic is same-origin; the proxy is the only party that talks to
//! delivery origins.

pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, router, run_server};
