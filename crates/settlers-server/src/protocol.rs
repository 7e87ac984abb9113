//! WebSocket protocol messages for settlers multiplayer.

use serde::{Deserialize, Serialize};
use settlers_core::{
    ActionOutcome, BoardView, ErrorKind, GameAction, GameSnapshot, PlayerId,
};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom { player_name: String },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Start the game (host only)
    StartGame,

    /// Submit a game action
    GameAction { action: GameAction },

    /// Send chat message
    Chat { message: String },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully, seated as `seat`
    JoinedRoom { room: RoomInfo, seat: PlayerId },

    /// Left room successfully
    LeftRoom,

    /// Room membership changed
    RoomUpdated { room: RoomInfo },

    /// Game started
    GameStarted { board: BoardView },

    /// Game state as this client may see it
    GameState {
        snapshot: Box<GameSnapshot>,
        board: BoardView,
    },

    /// Result of this client's last action
    ActionResult {
        outcome: Option<ActionOutcome>,
        error: Option<ActionError>,
    },

    /// Active player changed
    TurnChanged { player: PlayerId, turn_number: u64 },

    /// The turn timer ran out for `player`
    TurnExpired { player: PlayerId },

    /// Chat message received
    ChatMessage { player_name: String, message: String },

    /// List of rooms waiting for players
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Game finished
    GameOver {
        winner: Option<PlayerId>,
        winner_name: Option<String>,
    },
}

/// A rejected action, classified for the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub kind: Option<ErrorKind>,
    pub message: String,
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: usize,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub seat: PlayerId,
    pub name: String,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}
