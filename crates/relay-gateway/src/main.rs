use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use relay_core::config::RelayConfig;
use relay_gateway::app::{build_router, AppState};

/// Multi-channel relay between messaging platforms and a research backend.
#[derive(Debug, Parser)]
#[command(name = "relay-gateway", version)]
struct Args {
    /// Config file (default: $RELAY_CONFIG, then ~/.relay/relay.toml).
    #[arg(long)]
    config: Option<String>,

    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_gateway=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = RelayConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        RelayConfig::default()
    });
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    if config.auth.keys.is_empty() {
        warn!("no API keys configured; /webhooks/incoming accepts only prefixed keys");
    }
    if config.gateway.insecure_skip_signatures {
        warn!("insecure_skip_signatures is on; unsigned WhatsApp payloads may be accepted");
    }

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;

    let state = Arc::new(AppState::from_config(config));
    info!(
        research = state.research.name(),
        fanout_targets = state.dispatcher.subscriptions().len(),
        "relay state ready"
    );

    let router = build_router(state);

    info!("Relay gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
