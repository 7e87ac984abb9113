//! The two halves of the turn state machine and the contested awards.
//!
//! The macro [`GameState`] tracks where the session is in its lifetime; the
//! micro [`PlayerTurnState`] tracks what the active player (or, while cards
//! are being discarded, any player) must do next. [`is_allowed`] decides
//! which micro states may be entered under which macro state.

use crate::board::PlayerId;
use serde::{Deserialize, Serialize};

/// Lifetime of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameState {
    /// Players are joining
    #[default]
    NotStarted,
    /// Snake-draft placement of the starting settlements and roads
    InitialPlacement,
    /// Normal turns
    GameInProgress,
    /// Someone reached the winning score
    EndOfGame,
}

/// What the game is waiting for inside a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlayerTurnState {
    #[default]
    None,
    PlacingSettlement,
    PlacingRoad,
    PlacingCity,
    NeedToRoll,
    TakeAction,
    /// A seven was rolled; any player who owes a discard may act
    AnyPlayerSelectingCardsToLose,
    PlacingRobber,
    SelectingPlayerToStealFrom,
    RequestingPlayerTrade,
    MonopolySelectingResource,
    YearOfPlentySelectingResources,
    RoadBuildingSelectingRoads,
}

impl PlayerTurnState {
    pub const ALL: [PlayerTurnState; 13] = [
        PlayerTurnState::None,
        PlayerTurnState::PlacingSettlement,
        PlayerTurnState::PlacingRoad,
        PlayerTurnState::PlacingCity,
        PlayerTurnState::NeedToRoll,
        PlayerTurnState::TakeAction,
        PlayerTurnState::AnyPlayerSelectingCardsToLose,
        PlayerTurnState::PlacingRobber,
        PlayerTurnState::SelectingPlayerToStealFrom,
        PlayerTurnState::RequestingPlayerTrade,
        PlayerTurnState::MonopolySelectingResource,
        PlayerTurnState::YearOfPlentySelectingResources,
        PlayerTurnState::RoadBuildingSelectingRoads,
    ];
}

impl GameState {
    pub const ALL: [GameState; 4] = [
        GameState::NotStarted,
        GameState::InitialPlacement,
        GameState::GameInProgress,
        GameState::EndOfGame,
    ];
}

/// Whether `turn` may be the active micro state while the game is in `game`.
pub fn is_allowed(game: GameState, turn: PlayerTurnState) -> bool {
    use PlayerTurnState as T;

    match turn {
        T::None => matches!(game, GameState::NotStarted | GameState::EndOfGame),
        T::PlacingSettlement | T::PlacingRoad => {
            matches!(game, GameState::InitialPlacement | GameState::GameInProgress)
        }
        T::PlacingCity
        | T::NeedToRoll
        | T::TakeAction
        | T::AnyPlayerSelectingCardsToLose
        | T::PlacingRobber
        | T::SelectingPlayerToStealFrom
        | T::RequestingPlayerTrade
        | T::MonopolySelectingResource
        | T::YearOfPlentySelectingResources
        | T::RoadBuildingSelectingRoads => game == GameState::GameInProgress,
    }
}

/// Holder of a contested bonus (longest road, largest army).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Award {
    pub holder: Option<PlayerId>,
    pub magnitude: u32,
}

impl Award {
    /// Claim the award for `player` if `magnitude` reaches `minimum` and
    /// strictly beats the current record. Returns true when the record moved.
    pub fn consider(&mut self, player: PlayerId, magnitude: u32, minimum: u32) -> bool {
        if magnitude < minimum || magnitude <= self.magnitude {
            return false;
        }
        self.holder = Some(player);
        self.magnitude = magnitude;
        true
    }

    pub fn is_held_by(&self, player: PlayerId) -> bool {
        self.holder == Some(player)
    }
}
