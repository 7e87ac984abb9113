//! Development cards and the draw pile.

use crate::error::GameError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Development card kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move the robber, counts toward largest army
    Knight,
    Library,
    Chapel,
    Market,
    University,
    GreatHall,
    /// Take two resources from the bank
    YearOfPlenty,
    /// Place two roads for free
    RoadBuilding,
    /// Take every card of one resource from the other players
    Monopoly,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 9] = [
        DevelopmentCard::Knight,
        DevelopmentCard::Library,
        DevelopmentCard::Chapel,
        DevelopmentCard::Market,
        DevelopmentCard::University,
        DevelopmentCard::GreatHall,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::Monopoly,
    ];

    /// Worth one point while in play
    pub fn is_victory_point(&self) -> bool {
        matches!(
            self,
            DevelopmentCard::Library
                | DevelopmentCard::Chapel
                | DevelopmentCard::Market
                | DevelopmentCard::University
                | DevelopmentCard::GreatHall
        )
    }

    /// Copies of this card in the standard deck
    fn standard_count(&self) -> usize {
        match self {
            DevelopmentCard::Knight => 14,
            DevelopmentCard::YearOfPlenty
            | DevelopmentCard::RoadBuilding
            | DevelopmentCard::Monopoly => 2,
            _ => 1,
        }
    }
}

/// Passes used when a new game shuffles its deck
pub const STANDARD_SHUFFLE_PASSES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentCardDeck {
    cards: Vec<DevelopmentCard>,
}

impl DevelopmentCardDeck {
    pub fn new(cards: Vec<DevelopmentCard>) -> Self {
        Self { cards }
    }

    /// The standard 25 card deck, unshuffled
    pub fn standard() -> Self {
        let cards = DevelopmentCard::ALL
            .iter()
            .flat_map(|card| std::iter::repeat(*card).take(card.standard_count()))
            .collect();
        Self { cards }
    }

    pub fn shuffle<R: Rng>(&mut self, passes: usize, rng: &mut R) {
        for _ in 0..passes {
            self.cards.shuffle(rng);
        }
    }

    pub fn draw(&mut self) -> Result<DevelopmentCard, GameError> {
        self.cards.pop().ok_or(GameError::DeckEmpty)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
