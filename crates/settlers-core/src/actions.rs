//! Game actions that players can take.
//!
//! [`GameAction`] is the serializable form of every player-initiated
//! operation on [`GameManager`]. Remote hosts decode an action, hand it to
//! [`GameManager::apply`] with the sender's id, and broadcast the
//! [`ActionOutcome`].

use crate::board::{Board, BuildingKind, PlayerId};
use crate::deck::DevelopmentCard;
use crate::dice::RollResult;
use crate::error::GameError;
use crate::game::GameManager;
use crate::hex::{EdgeCoord, HexCoord, PointCoord};
use crate::resources::{Resource, ResourceHand};
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameAction {
    // ==================== Dice & Robber ====================
    RollDice,
    /// Give up cards owed after a seven
    DiscardResources(ResourceHand),
    MoveRobber(HexCoord),
    StealFrom(PlayerId),

    // ==================== Trading ====================
    OfferTrade {
        give: ResourceHand,
        receive: ResourceHand,
    },
    SendCounterOffer {
        give: ResourceHand,
        receive: ResourceHand,
    },
    /// Active player takes another player's counter-offer
    AcceptCounterOffer(PlayerId),
    /// Another player takes the active player's offer as posted
    AcceptActiveOffer,
    CancelTrade,
    /// Trade with the bank (4:1) or a port (3:1 or 2:1)
    TradeWithBank {
        give: ResourceHand,
        receive: ResourceHand,
    },

    // ==================== Building ====================
    BuyDevelopmentCard,
    BeginPlacingRoad,
    BeginPlacingBuilding(BuildingKind),
    CancelPlacement,
    PlaceRoad(EdgeCoord),
    PlaceBuilding {
        kind: BuildingKind,
        point: PointCoord,
    },

    // ==================== Development Cards ====================
    PlayDevelopmentCard(DevelopmentCard),
    SelectMonopolyResource(Resource),
    SelectYearOfPlenty(Resource, Resource),
    /// One of the two roads granted by Road Building
    PlaceFreeRoad(EdgeCoord),

    // ==================== Turn Management ====================
    EndTurn,
}

/// What an applied action produced beyond the state change itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ActionOutcome {
    Done,
    Rolled(RollResult),
    /// Players the mover may now steal from
    RobberMoved { robbable: Vec<PlayerId> },
    /// Only the thief and victim should learn which card moved
    Stolen { victim: PlayerId, resource: Resource },
    DrewCard(DevelopmentCard),
    Monopoly { resource: Resource, amount: u32 },
}

impl<B: Board> GameManager<B> {
    /// Perform `action` on behalf of `player`
    pub fn apply(&mut self, player: PlayerId, action: GameAction) -> Result<ActionOutcome, GameError> {
        let outcome = match action {
            GameAction::RollDice => ActionOutcome::Rolled(self.roll_dice(player)?),
            GameAction::DiscardResources(hand) => {
                self.discard_resources(player, hand)?;
                ActionOutcome::Done
            }
            GameAction::MoveRobber(hex) => ActionOutcome::RobberMoved {
                robbable: self.move_robber(player, hex)?,
            },
            GameAction::StealFrom(victim) => ActionOutcome::Stolen {
                victim,
                resource: self.steal_from(player, victim)?,
            },

            GameAction::OfferTrade { give, receive } => {
                self.offer_trade(player, give, receive)?;
                ActionOutcome::Done
            }
            GameAction::SendCounterOffer { give, receive } => {
                self.send_counter_offer(player, give, receive)?;
                ActionOutcome::Done
            }
            GameAction::AcceptCounterOffer(counter_player) => {
                self.accept_counter_offer(player, counter_player)?;
                ActionOutcome::Done
            }
            GameAction::AcceptActiveOffer => {
                self.accept_active_offer(player)?;
                ActionOutcome::Done
            }
            GameAction::CancelTrade => {
                self.cancel_trade(player)?;
                ActionOutcome::Done
            }
            GameAction::TradeWithBank { give, receive } => {
                self.trade_with_bank(player, give, receive)?;
                ActionOutcome::Done
            }

            GameAction::BuyDevelopmentCard => {
                ActionOutcome::DrewCard(self.buy_development_card(player)?)
            }
            GameAction::BeginPlacingRoad => {
                self.begin_placing_road(player)?;
                ActionOutcome::Done
            }
            GameAction::BeginPlacingBuilding(kind) => {
                self.begin_placing_building(player, kind)?;
                ActionOutcome::Done
            }
            GameAction::CancelPlacement => {
                self.cancel_placement(player)?;
                ActionOutcome::Done
            }
            GameAction::PlaceRoad(edge) => {
                self.place_road(player, edge)?;
                ActionOutcome::Done
            }
            GameAction::PlaceBuilding { kind, point } => {
                self.place_building(player, kind, point)?;
                ActionOutcome::Done
            }

            GameAction::PlayDevelopmentCard(card) => {
                self.play_development_card(player, card)?;
                ActionOutcome::Done
            }
            GameAction::SelectMonopolyResource(resource) => ActionOutcome::Monopoly {
                resource,
                amount: self.select_monopoly_resource(player, resource)?,
            },
            GameAction::SelectYearOfPlenty(first, second) => {
                self.select_year_of_plenty(player, first, second)?;
                ActionOutcome::Done
            }
            GameAction::PlaceFreeRoad(edge) => {
                self.place_free_road(player, edge)?;
                ActionOutcome::Done
            }

            GameAction::EndTurn => {
                self.end_turn(player)?;
                ActionOutcome::Done
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_board::HexBoard;
    use crate::settings::GameSettings;
    use crate::state::PlayerTurnState;
    use pretty_assertions::assert_eq;

    fn started() -> GameManager<HexBoard> {
        let mut game = GameManager::with_seed(HexBoard::standard(3), GameSettings::default(), 3);
        game.add_player("Ana").unwrap();
        game.add_player("Bo").unwrap();
        game.start_new_game().unwrap();
        game
    }

    #[test]
    fn test_apply_drives_setup() {
        let mut game = started();
        let point = game.legal_building_placements(0, BuildingKind::Settlement)[0];
        let outcome = game
            .apply(0, GameAction::PlaceBuilding { kind: BuildingKind::Settlement, point })
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Done);
        assert_eq!(game.turn_state(), PlayerTurnState::PlacingRoad);

        let edge = game.legal_road_placements(0)[0];
        game.apply(0, GameAction::PlaceRoad(edge)).unwrap();
        assert_eq!(game.active_player_id(), Some(1));
    }

    #[test]
    fn test_apply_propagates_errors() {
        let mut game = started();
        assert_eq!(game.apply(1, GameAction::RollDice), Err(GameError::OutOfTurn));
        assert!(matches!(
            game.apply(0, GameAction::EndTurn),
            Err(GameError::WrongState { .. })
        ));
    }

    #[test]
    fn test_action_json_shape() {
        let action = GameAction::SelectYearOfPlenty(Resource::Ore, Resource::Wheat);
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"SelectYearOfPlenty","data":["Ore","Wheat"]}"#);

        let decoded: GameAction = serde_json::from_str(r#"{"type":"EndTurn"}"#).unwrap();
        assert_eq!(decoded, GameAction::EndTurn);
    }
}
