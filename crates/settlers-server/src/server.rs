//! WebSocket server and connection handling.
//!
//! Each room lives behind its `DashMap` entry guard, so an action is
//! validated and applied while no other connection can touch that room.
//! Guards are always dropped before messages are delivered.

use crate::protocol::{ClientMessage, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use crate::timer::TurnTimer;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use settlers_core::{GameSettings, GameState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Messages addressed to individual connections
type Outbox = Vec<(Uuid, ServerMessage)>;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Rules for newly created rooms
    pub game_settings: GameSettings,
}

impl ServerState {
    pub fn new(game_settings: GameSettings) -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            game_settings,
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    pub fn send_error(&self, player_id: Uuid, message: impl Into<String>) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.into(),
            },
        );
    }

    pub fn deliver(&self, outbox: Outbox) {
        for (player_id, msg) in outbox {
            self.send_to_player(player_id, msg);
        }
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        let outbox = to_all(&room, msg);
        drop(room);
        self.deliver(outbox);
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<crate::protocol::RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status() == RoomStatus::Waiting && !r.is_full())
            .map(|r| r.to_info())
            .collect()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

fn to_all(room: &GameRoom, msg: ServerMessage) -> Outbox {
    room.member_order.iter().map(|id| (*id, msg.clone())).collect()
}

/// Fresh game state for every member, plus turn and end-of-game notices.
/// Also re-arms the turn timer when the turn has changed hands.
fn game_update(state: &Arc<ServerState>, room: &mut GameRoom, was_over: bool) -> Outbox {
    let mut outbox = room.state_messages();
    if let Some(turn) = room.turn_message() {
        outbox.extend(to_all(room, turn));
    }
    if !was_over {
        if let Some(over) = room.game_over_message() {
            outbox.extend(to_all(room, over));
        }
    }
    arm_timer(state, room);
    outbox
}

fn arm_timer(state: &Arc<ServerState>, room: &mut GameRoom) {
    let limit = room.game.settings().turn_time_limit();
    match limit {
        Some(limit) if room.game.game_state() == GameState::GameInProgress => {
            let turn = room.game.turn_number();
            if room.timed_turn() == Some(turn) {
                return;
            }
            let state = Arc::clone(state);
            let room_id = room.id;
            debug!(%room_id, turn, ?limit, "turn timer armed");
            room.set_timer(Some(TurnTimer::start(turn, limit, async move {
                expire_turn(&state, room_id, turn);
            })));
        }
        _ => room.set_timer(None),
    }
}

/// Timer callback: end the turn unless it already moved on
fn expire_turn(state: &Arc<ServerState>, room_id: Uuid, turn: u64) {
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };
    let Some(player) = room.expire_turn(turn) else {
        debug!(%room_id, turn, "stale turn timer ignored");
        return;
    };
    info!(%room_id, player, turn, "turn time limit reached");

    let mut outbox = to_all(&room, ServerMessage::TurnExpired { player });
    outbox.extend(game_update(state, &mut room, false));
    drop(room);
    state.deliver(outbox);
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Settlers server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode message: {}", e),
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {e}"));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

fn current_room(state: &ServerState, player_id: Uuid) -> Option<Uuid> {
    state.player_rooms.get(&player_id).map(|r| *r)
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom { player_name } => {
            if current_room(state, player_id).is_some() {
                state.send_error(player_id, "Already in a room");
                return;
            }
            let room_id = Uuid::new_v4();
            match GameRoom::new(room_id, player_id, player_name, state.game_settings.clone()) {
                Ok(room) => {
                    let room_info = room.to_info();
                    state.rooms.insert(room_id, room);
                    state.player_rooms.insert(player_id, room_id);
                    info!(%room_id, host = %player_id, "room created");

                    state.send_to_player(player_id, ServerMessage::RoomCreated { room_id });
                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info,
                            seat: 0,
                        },
                    );
                }
                Err(e) => state.send_error(player_id, e.to_string()),
            }
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            if current_room(state, player_id).is_some() {
                state.send_error(player_id, "Already in a room");
                return;
            }
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                state.send_error(player_id, "Room not found");
                return;
            };
            match room.add_player(player_id, player_name) {
                Ok(seat) => {
                    let room_info = room.to_info();
                    let mut outbox = to_all(&room, ServerMessage::RoomUpdated {
                        room: room_info.clone(),
                    });
                    outbox.retain(|(id, _)| *id != player_id);
                    drop(room);

                    state.player_rooms.insert(player_id, room_id);
                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info,
                            seat,
                        },
                    );
                    state.deliver(outbox);
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e.to_string());
                }
            }
        }

        ClientMessage::LeaveRoom => {
            if leave_room(player_id, state) {
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::StartGame => {
            let Some(room_id) = current_room(state, player_id) else {
                state.send_error(player_id, "Not in a room");
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };
            match room.start_game(player_id) {
                Ok(()) => {
                    info!(%room_id, players = room.player_count(), "game started");
                    let mut outbox = to_all(&room, ServerMessage::GameStarted {
                        board: room.game.board().view(),
                    });
                    outbox.extend(game_update(state, &mut room, false));
                    drop(room);
                    state.deliver(outbox);
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e.to_string());
                }
            }
        }

        ClientMessage::GameAction { action } => {
            let Some(room_id) = current_room(state, player_id) else {
                state.send_error(player_id, "Not in a room");
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };
            let was_over = room.status() == RoomStatus::Finished;
            debug!(%room_id, %player_id, ?action, "game action");

            match room.apply_action(player_id, action) {
                Ok(outcome) => {
                    let mut outbox = vec![(
                        player_id,
                        ServerMessage::ActionResult {
                            outcome: Some(outcome),
                            error: None,
                        },
                    )];
                    outbox.extend(game_update(state, &mut room, was_over));
                    drop(room);
                    state.deliver(outbox);
                }
                Err(e) => {
                    drop(room);
                    debug!(%player_id, "action rejected: {}", e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionResult {
                            outcome: None,
                            error: Some(e.to_action_error()),
                        },
                    );
                }
            }
        }

        ClientMessage::Chat { message } => {
            let Some(room_id) = current_room(state, player_id) else {
                return;
            };
            let player_name = state
                .rooms
                .get(&room_id)
                .and_then(|r| r.members.get(&player_id).map(|p| p.name.clone()))
                .unwrap_or_else(|| "Unknown".to_string());

            state.broadcast_to_room(
                room_id,
                ServerMessage::ChatMessage {
                    player_name,
                    message,
                },
            );
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Remove a connection from its room and the game it is playing.
/// Returns false if it was not in a room.
fn leave_room(player_id: Uuid, state: &Arc<ServerState>) -> bool {
    let Some((_, room_id)) = state.player_rooms.remove(&player_id) else {
        return false;
    };
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return true;
    };

    let was_over = room.status() == RoomStatus::Finished;
    let in_game = room.status() == RoomStatus::InGame;
    match room.remove_player(player_id) {
        Ok(true) => {
            room.set_timer(None);
            drop(room);
            state.rooms.remove(&room_id);
            info!(%room_id, "room closed");
        }
        Ok(false) => {
            let mut outbox = to_all(&room, ServerMessage::RoomUpdated {
                room: room.to_info(),
            });
            if in_game {
                outbox.extend(game_update(state, &mut room, was_over));
            }
            drop(room);
            state.deliver(outbox);
        }
        Err(RoomError::PlayerNotInRoom) => {}
        Err(e) => {
            drop(room);
            warn!(%room_id, %player_id, "failed to remove player: {}", e);
        }
    }
    true
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if leave_room(player_id, state) {
        info!(%player_id, "disconnected player removed from room");
    }
}
