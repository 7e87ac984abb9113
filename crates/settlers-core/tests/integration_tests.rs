//! Integration tests for the settlers rules engine.
//!
//! These tests drive complete flows through the public API, mostly against a
//! scripted board so awards and yields can be controlled exactly.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use settlers_core::*;

fn in_progress(players: usize) -> (ScriptedGame, std::rc::Rc<std::cell::RefCell<Script>>) {
    let (mut game, script) = scripted_game(players, GameSettings::default());
    complete_setup(&mut game);
    (game, script)
}

#[test]
fn test_four_player_snake_draft() {
    let (mut game, _script) = scripted_game(4, GameSettings::default());
    let order = complete_setup(&mut game);

    assert_eq!(order, vec![0, 1, 2, 3, 3, 2, 1, 0]);
    assert_eq!(game.game_state(), GameState::GameInProgress);
    assert_eq!(game.turn_state(), PlayerTurnState::NeedToRoll);
    assert_eq!(game.active_player_id(), Some(0));
}

#[test]
fn test_setup_on_standard_board() {
    let mut game = GameManager::with_seed(HexBoard::standard(21), GameSettings::default(), 21);
    for name in ["Ana", "Bo", "Cy"] {
        game.add_player(name).unwrap();
    }
    game.start_new_game().unwrap();
    complete_setup(&mut game);

    for player in game.players() {
        assert_eq!(game.board().building_count(player.id, None), 2);
        assert_eq!(game.board().road_count(player.id), 2);
        assert_eq!(game.score(player.id), 2);
    }
    let view = game.board().view();
    assert_eq!(view.buildings.len(), 6);
    assert_eq!(view.roads.len(), 6);
}

#[test]
fn test_seven_requires_exact_discards() {
    let (mut game, script) = in_progress(3);
    {
        let mut script = script.borrow_mut();
        let payout = script.yields.entry(6).or_default();
        payout.insert(1, ResourceHand::with_amounts(3, 3, 3, 0, 0));
        payout.insert(2, ResourceHand::single(Resource::Sheep, 10));
    }
    rig_dice(&mut game, 6);
    game.roll_dice(0).unwrap();
    game.end_turn(0).unwrap();

    rig_dice(&mut game, 7);
    game.roll_dice(1).unwrap();
    assert_eq!(game.turn_state(), PlayerTurnState::AnyPlayerSelectingCardsToLose);
    assert_eq!(game.pending_discards().get(&0), None);
    assert_eq!(game.pending_discards().get(&1), Some(&4));
    assert_eq!(game.pending_discards().get(&2), Some(&5));

    let err = game
        .discard_resources(1, ResourceHand::with_amounts(3, 0, 0, 0, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDiscard);
    assert_eq!(
        err.to_string(),
        "Incorrect number of cards to discard. Selected: 3. Required: 4."
    );

    game.discard_resources(1, ResourceHand::with_amounts(2, 2, 0, 0, 0)).unwrap();
    assert_eq!(game.turn_state(), PlayerTurnState::AnyPlayerSelectingCardsToLose);

    game.discard_resources(2, ResourceHand::single(Resource::Sheep, 5)).unwrap();
    assert_eq!(game.turn_state(), PlayerTurnState::PlacingRobber);
    assert_eq!(game.player(1).unwrap().hand_size(), 5);
    assert_eq!(game.player(2).unwrap().hand_size(), 5);
}

#[test]
fn test_settlement_cost_and_failure_leaves_state() {
    let (mut game, script) = in_progress(2);
    roll_paying(&mut game, &script, 0, 8, ResourceHand::with_amounts(1, 1, 1, 0, 0));

    let before = game.snapshot(Some(0));
    let err = game
        .begin_placing_building(0, BuildingKind::Settlement)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientResources);
    assert_eq!(game.snapshot(Some(0)), before);

    game.end_turn(0).unwrap();
    roll_paying(&mut game, &script, 0, 9, ResourceHand::single(Resource::Sheep, 1));
    game.end_turn(1).unwrap();
    rig_dice(&mut game, 2);
    game.roll_dice(0).unwrap();

    let settlements = game.player(0).unwrap().settlements_available;
    game.begin_placing_building(0, BuildingKind::Settlement).unwrap();
    let point = game.legal_building_placements(0, BuildingKind::Settlement)[0];
    game.place_building(0, BuildingKind::Settlement, point).unwrap();

    let player = game.player(0).unwrap();
    assert!(player.resources.is_empty());
    assert_eq!(player.settlements_available, settlements - 1);
    assert_eq!(game.score(0), 3);
}

#[test]
fn test_city_upgrade_piece_accounting() {
    let (mut game, script) = in_progress(2);
    roll_paying(&mut game, &script, 0, 8, ResourceHand::with_amounts(0, 0, 2, 0, 3));

    let before = game.player(0).unwrap().clone();
    game.begin_placing_building(0, BuildingKind::City).unwrap();
    let point = game.legal_building_placements(0, BuildingKind::City)[0];
    game.place_building(0, BuildingKind::City, point).unwrap();

    let after = game.player(0).unwrap();
    assert!(after.resources.is_empty());
    assert_eq!(after.settlements_available, before.settlements_available + 1);
    assert_eq!(after.cities_available, before.cities_available - 1);
    assert_eq!(game.score(0), 3);
    assert_pieces_accounted(&game);
}

#[test]
fn test_longest_road_needs_minimum_and_strict_lead() {
    let (mut game, script) = in_progress(2);
    let two_roads = ResourceHand::with_amounts(2, 2, 0, 0, 0);

    roll_paying(&mut game, &script, 0, 8, two_roads);
    script.borrow_mut().road_lengths.insert(0, 4);
    build_road(&mut game, 0);
    assert_eq!(game.longest_road().holder, None);

    script.borrow_mut().road_lengths.insert(0, 5);
    build_road(&mut game, 0);
    assert_eq!(game.longest_road(), Award { holder: Some(0), magnitude: 5 });
    assert_eq!(game.score(0), 4);
    game.end_turn(0).unwrap();

    roll_paying(&mut game, &script, 1, 8, two_roads);
    script.borrow_mut().road_lengths.insert(1, 5);
    build_road(&mut game, 1);
    assert_eq!(game.longest_road().holder, Some(0), "a tie never transfers");

    script.borrow_mut().road_lengths.insert(1, 6);
    build_road(&mut game, 1);
    assert_eq!(game.longest_road(), Award { holder: Some(1), magnitude: 6 });
    assert_eq!(game.score(0), 2);
    assert_eq!(game.score(1), 4);
    assert!(game.player(1).unwrap().resources.is_empty());
}

fn build_road(game: &mut ScriptedGame, player: PlayerId) {
    game.begin_placing_road(player).unwrap();
    let edge = game.legal_road_placements(player)[0];
    game.place_road(player, edge).unwrap();
}

#[test]
fn test_counter_offer_round_trip() {
    let (mut game, script) = in_progress(2);
    roll_paying(&mut game, &script, 0, 8, ResourceHand::single(Resource::Wood, 2));
    game.end_turn(0).unwrap();
    roll_paying(&mut game, &script, 1, 8, ResourceHand::single(Resource::Ore, 1));
    game.end_turn(1).unwrap();
    rig_dice(&mut game, 2);
    game.roll_dice(0).unwrap();

    let two_wood = ResourceHand::single(Resource::Wood, 2);
    let one_ore = ResourceHand::single(Resource::Ore, 1);
    game.apply(0, GameAction::OfferTrade { give: two_wood, receive: one_ore })
        .unwrap();
    game.apply(1, GameAction::SendCounterOffer { give: one_ore, receive: two_wood })
        .unwrap();
    game.apply(0, GameAction::AcceptCounterOffer(1)).unwrap();

    assert_eq!(game.player(0).unwrap().resources, one_ore);
    assert_eq!(game.player(1).unwrap().resources, two_wood);
    assert!(game.trades().active_offer().is_none());
    assert_eq!(game.trades().counter_offers().count(), 0);
    assert_eq!(game.turn_state(), PlayerTurnState::TakeAction);
}

#[test]
fn test_port_rates_for_bank_trade() {
    let (mut game, script) = in_progress(2);
    script
        .borrow_mut()
        .ports
        .insert(0, vec![Port::Specific(Resource::Sheep)]);
    roll_paying(&mut game, &script, 0, 8, ResourceHand::with_amounts(3, 0, 0, 2, 0));

    assert!(game
        .trade_with_bank(
            0,
            ResourceHand::single(Resource::Wood, 3),
            ResourceHand::single(Resource::Ore, 1)
        )
        .is_err());
    game.trade_with_bank(
        0,
        ResourceHand::single(Resource::Sheep, 2),
        ResourceHand::single(Resource::Ore, 1),
    )
    .unwrap();
    assert_eq!(
        game.player(0).unwrap().resources,
        ResourceHand::with_amounts(3, 0, 0, 0, 1)
    );
}

#[test]
fn test_robber_steals_from_scripted_neighbor() {
    let (mut game, script) = in_progress(3);
    roll_paying(&mut game, &script, 2, 8, ResourceHand::single(Resource::Brick, 1));
    script.borrow_mut().robber_neighbors = vec![0, 1, 2];
    game.end_turn(0).unwrap();

    rig_dice(&mut game, 7);
    game.roll_dice(1).unwrap();
    let outcome = game
        .apply(1, GameAction::MoveRobber(HexCoord::new(1, 0)))
        .unwrap();
    // player 0 has no cards and player 1 is the mover
    assert_eq!(outcome, ActionOutcome::RobberMoved { robbable: vec![2] });

    let outcome = game.apply(1, GameAction::StealFrom(2)).unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Stolen { victim: 2, resource: Resource::Brick }
    );
    assert_eq!(game.turn_state(), PlayerTurnState::TakeAction);
}

#[test]
fn test_robber_skips_neighbor_with_empty_hand() {
    let (mut game, script) = in_progress(2);
    script.borrow_mut().robber_neighbors = vec![1];
    rig_dice(&mut game, 7);
    game.roll_dice(0).unwrap();
    assert_eq!(game.turn_state(), PlayerTurnState::PlacingRobber);
    assert_eq!(game.player(1).unwrap().hand_size(), 0);

    let outcome = game
        .apply(0, GameAction::MoveRobber(HexCoord::new(1, 0)))
        .unwrap();
    assert_eq!(outcome, ActionOutcome::RobberMoved { robbable: vec![] });
    assert_eq!(game.turn_state(), PlayerTurnState::TakeAction);
    assert!(game.robbable_players().is_empty());
}

#[test]
fn test_departed_player_keeps_award() {
    let (mut game, script) = in_progress(3);
    roll_paying(&mut game, &script, 0, 8, PurchasableItem::Road.cost());
    script.borrow_mut().road_lengths.insert(0, 7);
    build_road(&mut game, 0);
    assert_eq!(game.longest_road().holder, Some(0));

    game.remove_player(0).unwrap();
    assert_eq!(game.longest_road().holder, Some(0));
    assert_eq!(game.active_player_id(), Some(1));
    assert_eq!(game.turn_state(), PlayerTurnState::NeedToRoll);
}

#[test]
fn test_turn_number_detects_stale_expiry() {
    let (mut game, _script) = in_progress(2);
    let turn = game.turn_number();
    rig_dice(&mut game, 3);
    game.roll_dice(0).unwrap();
    game.end_turn(0).unwrap();
    assert_eq!(game.turn_number(), turn + 1);

    assert_eq!(game.expire_turn(), Ok(0));
    assert_eq!(game.turn_number(), turn + 2);
}

/// Pick something plausible for whoever must act next
fn random_action(game: &GameManager<HexBoard>, rng: &mut StdRng) -> Option<(PlayerId, GameAction)> {
    if let Some((&player, &owed)) = game.pending_discards().iter().next() {
        let hand = game.player(player)?.resources;
        let mut discard = ResourceHand::new();
        let mut left = owed;
        for (resource, count) in hand.iter() {
            let take = count.min(left);
            discard.add(resource, take);
            left -= take;
        }
        return Some((player, GameAction::DiscardResources(discard)));
    }

    let player = game.active_player_id()?;
    let action = match game.turn_state() {
        PlayerTurnState::NeedToRoll => GameAction::RollDice,
        PlayerTurnState::PlacingRobber => {
            let robber = game.board().robber_location();
            let hexes: Vec<HexCoord> = game
                .board()
                .tiles()
                .map(|t| t.coord)
                .filter(|c| Some(*c) != robber)
                .collect();
            GameAction::MoveRobber(*hexes.choose(rng)?)
        }
        PlayerTurnState::SelectingPlayerToStealFrom => {
            GameAction::StealFrom(*game.robbable_players().first()?)
        }
        PlayerTurnState::PlacingRoad => match game.legal_road_placements(player).choose(rng) {
            Some(edge) => GameAction::PlaceRoad(*edge),
            None => GameAction::CancelPlacement,
        },
        PlayerTurnState::PlacingSettlement | PlayerTurnState::PlacingCity => {
            let kind = if game.turn_state() == PlayerTurnState::PlacingCity {
                BuildingKind::City
            } else {
                BuildingKind::Settlement
            };
            match game.legal_building_placements(player, kind).choose(rng) {
                Some(point) => GameAction::PlaceBuilding { kind, point: *point },
                None => GameAction::CancelPlacement,
            }
        }
        PlayerTurnState::RoadBuildingSelectingRoads => {
            GameAction::PlaceFreeRoad(*game.legal_road_placements(player).choose(rng)?)
        }
        PlayerTurnState::MonopolySelectingResource => {
            GameAction::SelectMonopolyResource(*Resource::ALL.choose(rng)?)
        }
        PlayerTurnState::YearOfPlentySelectingResources => GameAction::SelectYearOfPlenty(
            *Resource::ALL.choose(rng)?,
            *Resource::ALL.choose(rng)?,
        ),
        PlayerTurnState::RequestingPlayerTrade => GameAction::CancelTrade,
        PlayerTurnState::TakeAction => {
            let hand = game.player(player)?.resources;
            match rng.gen_range(0..7) {
                0 => GameAction::BeginPlacingRoad,
                1 => GameAction::BeginPlacingBuilding(BuildingKind::Settlement),
                2 => GameAction::BeginPlacingBuilding(BuildingKind::City),
                3 => GameAction::BuyDevelopmentCard,
                4 => match game.player(player)?.development_cards.first() {
                    Some(card) => GameAction::PlayDevelopmentCard(*card),
                    None => GameAction::EndTurn,
                },
                5 => {
                    let Some((resource, count)) = hand.iter().max_by_key(|(_, count)| *count)
                    else {
                        return Some((player, GameAction::EndTurn));
                    };
                    if count < BANK_RATE {
                        return Some((player, GameAction::EndTurn));
                    }
                    let wanted = Resource::ALL
                        .into_iter()
                        .find(|r| *r != resource)
                        .unwrap_or(Resource::Ore);
                    GameAction::TradeWithBank {
                        give: ResourceHand::single(resource, BANK_RATE),
                        receive: ResourceHand::single(wanted, 1),
                    }
                }
                _ => GameAction::EndTurn,
            }
        }
        PlayerTurnState::None | PlayerTurnState::AnyPlayerSelectingCardsToLose => return None,
    };
    Some((player, action))
}

fn assert_pieces_accounted<B: Board>(game: &GameManager<B>) {
    for player in game.players() {
        let board = game.board();
        let settlements = board.building_count(player.id, Some(BuildingKind::Settlement));
        let cities = board.building_count(player.id, Some(BuildingKind::City));
        assert_eq!(player.roads_available + board.road_count(player.id), 15);
        // upgrading to a city hands the settlement piece back
        assert_eq!(player.settlements_available + settlements, 5);
        assert_eq!(player.cities_available + cities, 4);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn random_play_keeps_ledgers_consistent(seed in any::<u64>(), players in 2usize..=4) {
        let mut game = GameManager::with_seed(HexBoard::standard(seed), GameSettings::default(), seed);
        for i in 0..players {
            game.add_player(format!("P{i}")).unwrap();
        }
        game.start_new_game().unwrap();
        complete_setup(&mut game);

        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..600 {
            if game.game_state() == GameState::EndOfGame {
                break;
            }
            let Some((player, action)) = random_action(&game, &mut rng) else {
                break;
            };
            let _ = game.apply(player, action);
            assert_pieces_accounted(&game);
            prop_assert!(is_allowed(game.game_state(), game.turn_state()));
        }

        if let Some(winner) = game.winner() {
            prop_assert_eq!(game.game_state(), GameState::EndOfGame);
            prop_assert!(game.score(winner) >= game.settings().score_needed_to_win);
        }
    }
}
