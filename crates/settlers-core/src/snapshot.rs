//! Serializable view of a session, filtered for one viewer.

use crate::board::{Board, PlayerId};
use crate::deck::DevelopmentCard;
use crate::dice::RollResult;
use crate::game::GameManager;
use crate::player::{Player, PlayerColor};
use crate::resources::ResourceHand;
use crate::settings::GameSettings;
use crate::state::{Award, GameState, PlayerTurnState};
use crate::trade::TradeOffer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One player as seen by the viewer. Hands and unplayed cards are only
/// filled in for the viewer themself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub score: u32,
    pub resource_count: u32,
    pub development_card_count: usize,
    pub resources: Option<ResourceHand>,
    pub development_cards: Option<Vec<DevelopmentCard>>,
    pub cards_in_play: Vec<DevelopmentCard>,
    pub roads_available: u32,
    pub settlements_available: u32,
    pub cities_available: u32,
}

impl PlayerView {
    fn new(player: &Player, score: u32, revealed: bool) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            color: player.color,
            score,
            resource_count: player.hand_size(),
            development_card_count: player.development_cards.len(),
            resources: revealed.then_some(player.resources),
            development_cards: revealed.then(|| player.development_cards.clone()),
            cards_in_play: player.cards_in_play.clone(),
            roads_available: player.roads_available,
            settlements_available: player.settlements_available,
            cities_available: player.cities_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_state: GameState,
    pub turn_state: PlayerTurnState,
    pub active_player: Option<PlayerId>,
    pub turn_number: u64,
    pub players: Vec<PlayerView>,
    pub current_roll: Option<RollResult>,
    pub active_offer: Option<TradeOffer>,
    pub counter_offers: Vec<TradeOffer>,
    pub pending_discards: BTreeMap<PlayerId, u32>,
    pub robbable_players: Vec<PlayerId>,
    pub free_roads_remaining: u32,
    pub longest_road: Award,
    pub largest_army: Award,
    pub development_cards_remaining: usize,
    pub winner: Option<PlayerId>,
    pub settings: GameSettings,
}

impl<B: Board> GameManager<B> {
    /// Everything `viewer` may see. `None` gives the public view.
    pub fn snapshot(&self, viewer: Option<PlayerId>) -> GameSnapshot {
        GameSnapshot {
            game_state: self.game_state(),
            turn_state: self.turn_state(),
            active_player: self.active_player_id(),
            turn_number: self.turn_number(),
            players: self
                .players()
                .iter()
                .map(|p| PlayerView::new(p, self.score(p.id), viewer == Some(p.id)))
                .collect(),
            current_roll: self.current_roll().cloned(),
            active_offer: self.trades().active_offer().cloned(),
            counter_offers: self.trades().counter_offers().cloned().collect(),
            pending_discards: self.pending_discards().clone(),
            robbable_players: self.robbable_players().to_vec(),
            free_roads_remaining: self.free_roads_remaining(),
            longest_road: self.longest_road(),
            largest_army: self.largest_army(),
            development_cards_remaining: self.development_cards_remaining(),
            winner: self.winner(),
            settings: self.settings().clone(),
        }
    }
}
