//! API Security Gateway
//!
//! A reverse proxy that polices every inbound request before it can reach
//! the protected upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                SECURITY GATEWAY                   │
//!                    │                                                   │
//!   Client Request   │  ┌───────┐   ┌──────┐   ┌────────────┐           │
//!   ─────────────────┼─▶│ entry │──▶│ auth │──▶│ rate limit │           │
//!                    │  │  log  │   │ 401  │   │  429/503   │           │
//!                    │  └───────┘   └──────┘   └─────┬──────┘           │
//!                    │                               │                   │
//!                    │                ┌──────────────┴────────┐          │
//!                    │                ▼                       ▼          │
//!   Client Response  │  ┌──────────────────┐   ┌──────────────────┐     │
//!   ◀────────────────┼──│ local handlers   │   │ upstream forward │◀────┼──── Backend
//!                    │  │   (/, /health)   │   │  + response      │     │
//!                    │  └──────────────────┘   │  reconstruction  │     │
//!                    │                         └──────────────────┘     │
//!                    │                                                   │
//!                    │  counters live in the external store (Redis);    │
//!                    │  this process keeps no per-client state          │
//!                    └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use security_gateway::config::loader::load_config;
use security_gateway::lifecycle::signals;
use security_gateway::{GatewayConfig, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "security-gateway")]
#[command(about = "API security gateway: key authentication and rate limiting in front of one upstream")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "security_gateway={},tower_http=warn",
                    config.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("security-gateway v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Metrics exporter runs on its own listener, outside the policed surface
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            security_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
