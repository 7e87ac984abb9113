//! Errors returned by every rule-checked operation.
//!
//! Rule violations are expected and recoverable: they are returned to the
//! caller with a readable message and never panic. Each error maps to a
//! coarse [`ErrorKind`] so clients can branch without matching on text.

use crate::state::{GameState, PlayerTurnState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not allowed to play out of turn")]
    OutOfTurn,

    #[error("Not allowed to take this action at this time (game: {game:?}, turn: {turn:?})")]
    WrongState {
        game: GameState,
        turn: PlayerTurnState,
    },

    #[error("{0}")]
    InsufficientResources(String),

    #[error("{0}")]
    NoPiecesRemaining(String),

    #[error("{0}")]
    InvalidPlacement(String),

    #[error("{0}")]
    InvalidTrade(String),

    #[error("{0}")]
    InvalidDiscard(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    NotFound(String),

    #[error("No development cards left in deck")]
    DeckEmpty,

    #[error("The game already has the maximum number of players")]
    GameFull,

    #[error("At least {required} players are needed to start, found {found}")]
    NotEnoughPlayers { required: usize, found: usize },
}

/// Coarse classification of a [`GameError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    OutOfTurn,
    WrongState,
    InsufficientResources,
    NoPiecesRemaining,
    InvalidPlacement,
    InvalidTrade,
    InvalidDiscard,
    InvalidTarget,
    NotFound,
    DeckEmpty,
    GameFull,
    NotEnoughPlayers,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::OutOfTurn => ErrorKind::OutOfTurn,
            GameError::WrongState { .. } => ErrorKind::WrongState,
            GameError::InsufficientResources(_) => ErrorKind::InsufficientResources,
            GameError::NoPiecesRemaining(_) => ErrorKind::NoPiecesRemaining,
            GameError::InvalidPlacement(_) => ErrorKind::InvalidPlacement,
            GameError::InvalidTrade(_) => ErrorKind::InvalidTrade,
            GameError::InvalidDiscard(_) => ErrorKind::InvalidDiscard,
            GameError::InvalidTarget(_) => ErrorKind::InvalidTarget,
            GameError::NotFound(_) => ErrorKind::NotFound,
            GameError::DeckEmpty => ErrorKind::DeckEmpty,
            GameError::GameFull => ErrorKind::GameFull,
            GameError::NotEnoughPlayers { .. } => ErrorKind::NotEnoughPlayers,
        }
    }

    pub(crate) fn placement(message: impl Into<String>) -> Self {
        GameError::InvalidPlacement(message.into())
    }

    pub(crate) fn trade(message: impl Into<String>) -> Self {
        GameError::InvalidTrade(message.into())
    }

    pub(crate) fn unknown_player(id: crate::board::PlayerId) -> Self {
        GameError::NotFound(format!("Player \"{id}\" does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(GameError::OutOfTurn.kind(), ErrorKind::OutOfTurn);
        assert_eq!(GameError::DeckEmpty.kind(), ErrorKind::DeckEmpty);
        assert_eq!(
            GameError::trade("Invalid trade offer").kind(),
            ErrorKind::InvalidTrade
        );
        assert_eq!(GameError::unknown_player(9).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(
            GameError::unknown_player(3).to_string(),
            "Player \"3\" does not exist"
        );
        let err = GameError::WrongState {
            game: GameState::GameInProgress,
            turn: PlayerTurnState::NeedToRoll,
        };
        assert!(err.to_string().starts_with("Not allowed to take this action"));
    }
}
