//! Centralized configuration for Spillway.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase. The service is
//! constructed once at startup with its configuration and passes it
//! explicitly to each component; there is no process-wide state.

use std::net::SocketAddr;
use std::time::Duration;

/// Central configuration for all Spillway components.
///
/// Groups related configuration settings into logical sections.
#[derive(Debug, Clone, Default)]
pub struct SpillwayConfig {
    /// Origin relay tuning.
    pub proxy: ProxyConfig,
    /// HTTP surface settings.
    pub server: ServerConfig,
}

/// Origin relay tuning.
///
/// Controls how the proxy talks to resolved delivery URLs: timeouts,
/// streaming granularity, and the outbound connection budget.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Timeout applied to the origin connect and to each body read.
    pub origin_timeout: Duration,
    /// Upper bound on a single relayed body chunk.
    pub chunk_size: usize,
    /// Maximum concurrent origin connections across all in-flight relays.
    ///
    /// A player fetches several segments in parallel; this caps the fan-out
    /// toward the origin and the process's descriptor usage.
    pub max_origin_connections: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            origin_timeout: Duration::from_secs(15),
            chunk_size: 8192, // 8 KiB
            max_origin_connections: 32,
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP surface binds to.
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}
