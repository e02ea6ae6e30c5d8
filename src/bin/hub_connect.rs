//! Hub connection monitor
//!
//! Connects to a hub endpoint over WebSocket, keeps the connection alive
//! through disconnects, and prints every message, error and transport
//! notification as it arrives.
//!
//! Usage:
//!   cargo run --bin hub_connect [config path]
//!
//! Environment variables:
//!   HUB_CONFIG_PATH - Configuration file (default: config/hub.yaml)
//!   HUB_URL         - Overrides the configured hub URL; enough on its own without a file
//!   RUST_LOG        - Overrides the configured log level

use anyhow::{Context, Result};
use hub_client::bin_common::{init_tracing, load_config_from_env, parse_args, resolve_config_type};
use hub_client::hubsockets::config::HUB_URL_ENV;
use hub_client::hubsockets::{
    spawn_transport, Connection, ConnectionState, HubConfig, HubConnection, HubConnectionBuilder,
    TransportEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How often the liveness line is printed
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Silence after which a connected socket is torn down and retried
const KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(60);

fn load_config() -> Result<HubConfig> {
    let path = load_config_from_env(resolve_config_type(&parse_args()));

    if path.exists() {
        return HubConfig::load(&path).with_context(|| format!("loading {}", path.display()));
    }

    let url = std::env::var(HUB_URL_ENV)
        .with_context(|| format!("{} not found and {} not set", path.display(), HUB_URL_ENV))?;
    let config = HubConfig::new(url);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    info!("========================================");
    info!("Hub connection monitor");
    info!("Endpoint: {}", config.url);
    info!("Press Ctrl+C to stop");
    info!("========================================");

    let connection: Arc<HubConnection> =
        Arc::new(HubConnectionBuilder::from_config(config).build());
    let errors = connection.errors();
    let messages = connection.messages();

    let transport = spawn_transport(connection.clone());
    transport.start(None)?;

    let mut poll = tokio::time::interval(Duration::from_millis(50));
    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }

            _ = status.tick() => {
                let state = connection.state();
                let liveness = connection.liveness();
                match liveness.time_since_last_activity() {
                    Some(idle) => {
                        info!("State: {} (last frame {:.1}s ago)", state, idle.as_secs_f64())
                    }
                    None => info!("State: {} (no frames yet)", state),
                }

                if state == ConnectionState::Connected && !liveness.is_alive(KEEP_ALIVE_TIMEOUT) {
                    warn!("No frame for {:?}, reconnecting", KEEP_ALIVE_TIMEOUT);
                    liveness.reset();
                    transport.lost_connection()?;
                }
            }

            _ = poll.tick() => {
                while let Some(event) = transport.try_recv_event() {
                    match event {
                        TransportEvent::Started { .. } => info!("Socket connected, handshake sent"),
                        TransportEvent::HandshakeCompleted => info!("Handshake completed"),
                        TransportEvent::FrameProcessed { error: Some(e), .. } => {
                            warn!("Frame rejected: {}", e)
                        }
                        TransportEvent::FrameProcessed { .. } => {}
                    }
                }
                while let Ok(e) = errors.try_recv() {
                    error!("Transport error: {}", e);
                }
                while let Ok(message) = messages.try_recv() {
                    println!("{}", serde_json::to_string(&message)?);
                }
            }
        }
    }

    transport.shutdown().await?;
    info!("Hub connection monitor stopped");
    Ok(())
}
