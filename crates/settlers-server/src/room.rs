//! Game room management.
//!
//! A room owns one game session. Connections are identified by `Uuid`; the
//! engine knows them only by the seat it handed out when they joined.

use settlers_core::{
    ActionOutcome, GameAction, GameError, GameManager, GameSettings, GameState, HexBoard,
    PlayerId, MAX_PLAYERS,
};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{ActionError, PlayerInfo, RoomInfo, RoomStatus, ServerMessage};
use crate::timer::TurnTimer;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    pub fn to_action_error(&self) -> ActionError {
        ActionError {
            kind: match self {
                RoomError::Game(err) => Some(err.kind()),
                _ => None,
            },
            message: self.to_string(),
        }
    }
}

/// A connection seated in a room.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub id: Uuid,
    pub seat: PlayerId,
    pub name: String,
}

impl RoomMember {
    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            seat: self.seat,
            name: self.name.clone(),
        }
    }
}

/// A game room that can hold up to four players.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub host_id: Uuid,
    pub members: HashMap<Uuid, RoomMember>,
    /// Join order, which is also seat order
    pub member_order: Vec<Uuid>,
    pub game: GameManager<HexBoard>,
    timer: Option<TurnTimer>,
}

impl GameRoom {
    pub fn new(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        settings: GameSettings,
    ) -> Result<Self, RoomError> {
        let mut room = Self {
            id,
            name: format!("{}'s Game", host_name),
            host_id,
            members: HashMap::new(),
            member_order: Vec::new(),
            game: GameManager::new(HexBoard::default(), settings),
            timer: None,
        };
        room.add_player(host_id, host_name)?;
        Ok(room)
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_PLAYERS
    }

    pub fn status(&self) -> RoomStatus {
        match self.game.game_state() {
            GameState::NotStarted => RoomStatus::Waiting,
            GameState::InitialPlacement | GameState::GameInProgress => RoomStatus::InGame,
            GameState::EndOfGame => RoomStatus::Finished,
        }
    }

    pub fn add_player(&mut self, member_id: Uuid, name: String) -> Result<PlayerId, RoomError> {
        let seat = self.game.add_player(name.clone())?;
        self.members.insert(
            member_id,
            RoomMember {
                id: member_id,
                seat,
                name,
            },
        );
        self.member_order.push(member_id);
        Ok(seat)
    }

    /// Take a member out of the room and the game. Returns true when the
    /// room is now empty.
    pub fn remove_player(&mut self, member_id: Uuid) -> Result<bool, RoomError> {
        let member = self
            .members
            .remove(&member_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        self.member_order.retain(|&id| id != member_id);
        self.game.remove_player(member.seat)?;

        // If host left, assign new host
        if member_id == self.host_id {
            if let Some(&next) = self.member_order.first() {
                self.host_id = next;
            }
        }

        Ok(self.members.is_empty())
    }

    pub fn start_game(&mut self, requester_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        self.game.start_new_game()?;
        Ok(())
    }

    pub fn apply_action(
        &mut self,
        member_id: Uuid,
        action: GameAction,
    ) -> Result<ActionOutcome, RoomError> {
        let seat = self.seat_of(member_id)?;
        Ok(self.game.apply(seat, action)?)
    }

    pub fn seat_of(&self, member_id: Uuid) -> Result<PlayerId, RoomError> {
        self.members
            .get(&member_id)
            .map(|m| m.seat)
            .ok_or(RoomError::PlayerNotInRoom)
    }

    fn member_name(&self, seat: PlayerId) -> Option<String> {
        self.members
            .values()
            .find(|m| m.seat == seat)
            .map(|m| m.name.clone())
    }

    /// Per-member game state, each with their own hand revealed
    pub fn state_messages(&self) -> Vec<(Uuid, ServerMessage)> {
        let board = self.game.board().view();
        self.member_order
            .iter()
            .filter_map(|id| self.members.get(id))
            .map(|member| {
                let snapshot = self.game.snapshot(Some(member.seat));
                (
                    member.id,
                    ServerMessage::GameState {
                        snapshot: Box::new(snapshot),
                        board: board.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn turn_message(&self) -> Option<ServerMessage> {
        self.game
            .active_player_id()
            .map(|player| ServerMessage::TurnChanged {
                player,
                turn_number: self.game.turn_number(),
            })
    }

    pub fn game_over_message(&self) -> Option<ServerMessage> {
        if self.game.game_state() != GameState::EndOfGame {
            return None;
        }
        let winner = self.game.winner();
        Some(ServerMessage::GameOver {
            winner,
            winner_name: winner.and_then(|seat| self.member_name(seat)),
        })
    }

    /// The turn the current timer was armed for, if any
    pub fn timed_turn(&self) -> Option<u64> {
        self.timer.as_ref().map(TurnTimer::turn_number)
    }

    pub fn set_timer(&mut self, timer: Option<TurnTimer>) {
        if let Some(old) = std::mem::replace(&mut self.timer, timer) {
            old.cancel();
        }
    }

    /// End the turn if it is still the one the timer was armed for.
    /// Returns the seat whose turn ran out.
    pub fn expire_turn(&mut self, turn_number: u64) -> Option<PlayerId> {
        if self.game.turn_number() != turn_number
            || self.game.game_state() != GameState::GameInProgress
        {
            return None;
        }
        let expired = self.game.active_player_id()?;
        self.game.expire_turn().ok()?;
        Some(expired)
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .member_order
                .iter()
                .filter_map(|id| self.members.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: MAX_PLAYERS,
            host_id: self.host_id,
            status: self.status(),
        }
    }
}
