//! Settlers - rules engine for a hex-tile settlement building game
//!
//! This crate provides the core game logic, including:
//! - Turn and phase state machine with full rule enforcement
//! - Resources, purchases, development cards and dice
//! - Player-to-player and bank trading
//! - Longest road and largest army awards
//! - A hex-grid reference board
//!
//! # Architecture
//!
//! [`GameManager`] owns one session and talks to the board only through the
//! [`Board`] trait, so hosts can plug in their own topology. It performs no
//! I/O; a server (or a test) drives it with direct calls or with
//! [`GameAction`] values.
//!
//! # Modules
//!
//! - [`game`]: The session state machine
//! - [`board`]: The board contract, ports and trade rates
//! - [`hex_board`]: Standard 19-tile board
//! - [`hex`]: Coordinate system for hexes, points and edges
//! - [`actions`]: Serializable player actions
//! - [`snapshot`]: Per-viewer serializable game view

pub mod actions;
pub mod board;
pub mod deck;
pub mod dice;
pub mod error;
pub mod game;
pub mod hex;
pub mod hex_board;
pub mod player;
pub mod resources;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod trade;

// Re-export commonly used types
pub use actions::{ActionOutcome, GameAction};
pub use board::{trade_rate, Board, BuildingKind, PlayerId, Port, RobberMode, BANK_RATE};
pub use deck::{DevelopmentCard, DevelopmentCardDeck};
pub use dice::{Dice, RollResult};
pub use error::{ErrorKind, GameError};
pub use game::GameManager;
pub use hex::{EdgeCoord, HexCoord, PointCoord};
pub use hex_board::{BoardView, HexBoard, PortPlacement, Tile, TileType};
pub use player::{Player, PlayerColor};
pub use resources::{PurchasableItem, Resource, ResourceHand};
pub use settings::{GameSettings, MAX_PLAYERS, MIN_PLAYERS};
pub use snapshot::{GameSnapshot, PlayerView};
pub use state::{is_allowed, Award, GameState, PlayerTurnState};
pub use trade::{TradeNegotiator, TradeOffer};
