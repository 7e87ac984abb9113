//! Player state: resource hand, development cards and remaining pieces.

use crate::board::PlayerId;
use crate::deck::DevelopmentCard;
use crate::error::GameError;
use crate::resources::{PurchasableItem, ResourceHand};
use serde::{Deserialize, Serialize};

/// Starting piece counts
pub const STARTING_ROADS: u32 = 15;
pub const STARTING_SETTLEMENTS: u32 = 5;
pub const STARTING_CITIES: u32 = 4;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Blue,
    Red,
    Green,
    Yellow,
}

impl PlayerColor {
    /// Colors in the order they are handed out
    pub const ALL: [PlayerColor; 4] = [
        PlayerColor::Blue,
        PlayerColor::Red,
        PlayerColor::Green,
        PlayerColor::Yellow,
    ];
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display name
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    /// Development cards held but not yet played
    pub development_cards: Vec<DevelopmentCard>,
    /// Development cards already played. Only ever grows.
    pub cards_in_play: Vec<DevelopmentCard>,
    pub roads_available: u32,
    pub settlements_available: u32,
    pub cities_available: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, color: PlayerColor) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            resources: ResourceHand::new(),
            development_cards: Vec::new(),
            cards_in_play: Vec::new(),
            roads_available: STARTING_ROADS,
            settlements_available: STARTING_SETTLEMENTS,
            cities_available: STARTING_CITIES,
        }
    }

    /// Return to the state of a freshly seated player, keeping identity
    pub fn reset(&mut self) {
        *self = Self::new(self.id, std::mem::take(&mut self.name), self.color);
    }

    pub fn can_afford(&self, item: PurchasableItem) -> bool {
        self.resources.contains(&item.cost())
    }

    fn pieces_available(&self, item: PurchasableItem) -> Option<u32> {
        match item {
            PurchasableItem::Road => Some(self.roads_available),
            PurchasableItem::Settlement => Some(self.settlements_available),
            PurchasableItem::City => Some(self.cities_available),
            PurchasableItem::DevelopmentCard => None,
        }
    }

    /// Whether a purchase would succeed. Checks cost (unless free) then pieces.
    pub fn check_purchase(&self, item: PurchasableItem, free: bool) -> Result<(), GameError> {
        if !free && !self.can_afford(item) {
            return Err(GameError::InsufficientResources(format!(
                "Not enough resources to buy a {}",
                item.name()
            )));
        }
        if self.pieces_available(item) == Some(0) {
            return Err(GameError::NoPiecesRemaining(format!(
                "No {} pieces remaining",
                item.name()
            )));
        }
        Ok(())
    }

    /// Pay for `item` and take the piece. Nothing changes on failure.
    pub fn purchase(&mut self, item: PurchasableItem, free: bool) -> Result<(), GameError> {
        self.check_purchase(item, free)?;

        if !free {
            self.resources.remove(&item.cost());
        }
        match item {
            PurchasableItem::Road => self.roads_available -= 1,
            PurchasableItem::Settlement => self.settlements_available -= 1,
            PurchasableItem::City => {
                // the upgraded settlement comes back
                self.cities_available -= 1;
                self.settlements_available += 1;
            }
            PurchasableItem::DevelopmentCard => {}
        }
        Ok(())
    }

    /// Move one card of this kind from the hand into play
    pub fn play_development_card(&mut self, card: DevelopmentCard) -> Result<(), GameError> {
        let position = self
            .development_cards
            .iter()
            .position(|c| *c == card)
            .ok_or_else(|| GameError::NotFound(format!("No {card:?} card to play")))?;
        self.development_cards.remove(position);
        self.cards_in_play.push(card);
        Ok(())
    }

    /// Knights in play
    pub fn army_size(&self) -> u32 {
        self.cards_in_play
            .iter()
            .filter(|c| **c == DevelopmentCard::Knight)
            .count() as u32
    }

    /// Points from victory point cards in play
    pub fn victory_points_from_cards(&self) -> u32 {
        self.cards_in_play
            .iter()
            .filter(|c| c.is_victory_point())
            .count() as u32
    }

    pub fn hand_size(&self) -> u32 {
        self.resources.total()
    }
}
