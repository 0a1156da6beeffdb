//! CLI commands for the Spillway proxy.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use spillway_core::config::{ProxyConfig, ServerConfig, SpillwayConfig};
use spillway_core::tracing_setup::{CliLogLevel, init_tracing};
use spillway_resolve::{SourceResolver, StaticResolver};

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the streaming proxy server
    Serve {
        /// Address to bind the HTTP surface to
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Origin request timeout in seconds (connect and each read)
        #[arg(long, default_value_t = 15)]
        origin_timeout: u64,

        /// Upper bound on a single relayed chunk, in bytes
        #[arg(long, default_value_t = 8192)]
        chunk_size: usize,

        /// Maximum concurrent origin connections
        #[arg(long, default_value_t = 32)]
        origin_connections: usize,

        /// JSON source map for the static resolver
        ///
        /// Without it the server still runs; every video resolves to no
        /// candidates and playback requests answer with the terminal
        /// failure code.
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Console log level
        #[arg(long, default_value = "info")]
        log_level: CliLogLevel,
    },
}

/// Dispatches a parsed command.
///
/// # Errors
/// Returns an error when the source map is invalid or the server fails to
/// start.
pub async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve {
            bind,
            origin_timeout,
            chunk_size,
            origin_connections,
            sources,
            log_level,
        } => {
            init_tracing(log_level.as_tracing_level());

            let config = SpillwayConfig {
                proxy: ProxyConfig {
                    origin_timeout: Duration::from_secs(origin_timeout),
                    chunk_size,
                    max_origin_connections: origin_connections,
                },
                server: ServerConfig { bind_address: bind },
            };

            let resolver: Arc<dyn SourceResolver> = match sources {
                Some(path) => {
                    tracing::info!("loading source map from {}", path.display());
                    Arc::new(StaticResolver::from_json_file(&path)?)
                }
                None => {
                    tracing::warn!("no source map given; all videos will resolve empty");
                    Arc::new(StaticResolver::new())
                }
            };

            spillway_web::run_server(config, resolver).await
        }
    }
}
