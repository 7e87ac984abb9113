//! Settlers multiplayer game server.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod protocol;
mod room;
mod server;
mod timer;

use config::ServerConfig;
use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        addr = %config.addr,
        score_needed_to_win = config.game_settings.score_needed_to_win,
        "Starting settlers server..."
    );

    let state = Arc::new(ServerState::new(config.game_settings));

    server::run_server(config.addr, state).await
}
