//! Server configuration from the environment.

use anyhow::Context;
use settlers_core::GameSettings;
use std::net::SocketAddr;
use std::path::Path;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_filter: String,
    /// Applied to every new room
    pub game_settings: GameSettings,
}

impl ServerConfig {
    /// Reads `SERVER_ADDR`, `RUST_LOG` and the optional `GAME_SETTINGS` TOML path
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR is not a socket address")?;
        let log_filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
        let game_settings = match std::env::var("GAME_SETTINGS") {
            Ok(path) => load_settings(Path::new(&path))?,
            Err(_) => GameSettings::default(),
        };

        Ok(Self {
            addr,
            log_filter,
            game_settings,
        })
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<GameSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading game settings from {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Missing keys fall back to the standard rules
pub fn parse_settings(text: &str) -> anyhow::Result<GameSettings> {
    Ok(toml::from_str(text)?)
}
