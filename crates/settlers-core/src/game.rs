//! Core game state machine.
//!
//! [`GameManager`] is the single writer for one session. Every public
//! operation validates the acting player and the current turn state, mutates
//! players, trades, deck, dice and board, then moves the state machine on.
//! Rule violations come back as [`GameError`]; nothing is changed when an
//! operation fails.

use crate::board::{trade_rate, Board, BuildingKind, PlayerId, RobberMode};
use crate::deck::{DevelopmentCard, DevelopmentCardDeck, STANDARD_SHUFFLE_PASSES};
use crate::dice::{Dice, RollResult};
use crate::error::GameError;
use crate::hex::{EdgeCoord, HexCoord, PointCoord};
use crate::player::{Player, PlayerColor};
use crate::resources::{PurchasableItem, Resource, ResourceHand};
use crate::settings::{GameSettings, MAX_PLAYERS, MINIMUM_LARGEST_ARMY, MIN_PLAYERS};
use crate::state::{is_allowed, Award, GameState, PlayerTurnState};
use crate::trade::{TradeNegotiator, TradeOffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The rules engine for one game session
#[derive(Debug, Clone)]
pub struct GameManager<B: Board> {
    board: B,
    settings: GameSettings,
    /// Seated players in turn order
    players: Vec<Player>,
    turn_index: usize,
    deck: DevelopmentCardDeck,
    dice: Dice,
    game_state: GameState,
    turn_state: PlayerTurnState,
    current_roll: Option<RollResult>,
    trades: TradeNegotiator,
    /// Cards each player still owes after a seven
    pending_discards: BTreeMap<PlayerId, u32>,
    /// Players the robber can steal from
    pending_robbery: Vec<PlayerId>,
    free_roads_remaining: u32,
    longest_road: Award,
    largest_army: Award,
    next_player_id: PlayerId,
    /// Bumped whenever the active turn changes hands
    turn_number: u64,
    winner: Option<PlayerId>,
    rng: StdRng,
}

impl<B: Board> GameManager<B> {
    pub fn new(board: B, settings: GameSettings) -> Self {
        Self::with_rng(board, settings, StdRng::from_entropy())
    }

    /// A deterministic session: dice, deck order and thefts all follow `seed`
    pub fn with_seed(board: B, settings: GameSettings, seed: u64) -> Self {
        Self::with_rng(board, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(board: B, settings: GameSettings, mut rng: StdRng) -> Self {
        let dice = Dice::with_seed(settings.dice_count, rng.gen());
        Self {
            board,
            settings,
            players: Vec::new(),
            turn_index: 0,
            deck: DevelopmentCardDeck::standard(),
            dice,
            game_state: GameState::NotStarted,
            turn_state: PlayerTurnState::None,
            current_roll: None,
            trades: TradeNegotiator::new(),
            pending_discards: BTreeMap::new(),
            pending_robbery: Vec::new(),
            free_roads_remaining: 0,
            longest_road: Award::default(),
            largest_army: Award::default(),
            next_player_id: 0,
            turn_number: 0,
            winner: None,
            rng,
        }
    }

    // ==================== Queries ====================

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn turn_state(&self) -> PlayerTurnState {
        self.turn_state
    }

    /// The player whose turn it is, while a game is running
    pub fn active_player(&self) -> Option<&Player> {
        match self.game_state {
            GameState::InitialPlacement | GameState::GameInProgress => {
                self.players.get(self.turn_index)
            }
            GameState::NotStarted | GameState::EndOfGame => None,
        }
    }

    pub fn active_player_id(&self) -> Option<PlayerId> {
        self.active_player().map(|p| p.id)
    }

    pub fn current_roll(&self) -> Option<&RollResult> {
        self.current_roll.as_ref()
    }

    pub fn trades(&self) -> &TradeNegotiator {
        &self.trades
    }

    pub fn pending_discards(&self) -> &BTreeMap<PlayerId, u32> {
        &self.pending_discards
    }

    pub fn robbable_players(&self) -> &[PlayerId] {
        &self.pending_robbery
    }

    pub fn free_roads_remaining(&self) -> u32 {
        self.free_roads_remaining
    }

    pub fn longest_road(&self) -> Award {
        self.longest_road
    }

    pub fn largest_army(&self) -> Award {
        self.largest_army
    }

    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn development_cards_remaining(&self) -> usize {
        self.deck.len()
    }

    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    /// House rules such as excluded totals
    pub fn dice_mut(&mut self) -> &mut Dice {
        &mut self.dice
    }

    /// Victory points, derived from the board, cards in play and awards
    pub fn score(&self, id: PlayerId) -> u32 {
        let Some(player) = self.player(id) else {
            return 0;
        };
        let settlements = self.board.building_count(id, Some(BuildingKind::Settlement));
        let cities = self.board.building_count(id, Some(BuildingKind::City));
        let mut score = settlements + 2 * cities + player.victory_points_from_cards();
        if self.largest_army.is_held_by(id) {
            score += 2;
        }
        if self.longest_road.is_held_by(id) {
            score += 2;
        }
        score
    }

    pub fn scores(&self) -> BTreeMap<PlayerId, u32> {
        self.players.iter().map(|p| (p.id, self.score(p.id))).collect()
    }

    fn is_setup(&self) -> bool {
        self.game_state == GameState::InitialPlacement
    }

    pub fn legal_road_placements(&self, player: PlayerId) -> Vec<EdgeCoord> {
        self.board.legal_road_placements(player, self.is_setup())
    }

    pub fn legal_building_placements(&self, player: PlayerId, kind: BuildingKind) -> Vec<PointCoord> {
        self.board
            .legal_building_placements(player, kind, self.is_setup())
    }

    // ==================== Lobby ====================

    /// Seat a new player with the first free color
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, GameError> {
        if matches!(
            self.game_state,
            GameState::InitialPlacement | GameState::GameInProgress
        ) {
            return Err(self.wrong_state());
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::GameFull);
        }
        let color = PlayerColor::ALL
            .into_iter()
            .find(|color| self.players.iter().all(|p| p.color != *color))
            .ok_or(GameError::GameFull)?;

        let id = self.next_player_id;
        self.next_player_id += 1;
        let player = Player::new(id, name, color);
        info!(player = id, name = %player.name, ?color, "player joined");
        self.players.push(player);
        Ok(id)
    }

    /// Replace the settings between games
    pub fn update_settings(&mut self, settings: GameSettings) -> Result<(), GameError> {
        if matches!(
            self.game_state,
            GameState::InitialPlacement | GameState::GameInProgress
        ) {
            return Err(self.wrong_state());
        }
        self.dice.set_die_count(settings.dice_count);
        self.settings = settings;
        Ok(())
    }

    pub fn start_new_game(&mut self) -> Result<(), GameError> {
        if matches!(
            self.game_state,
            GameState::InitialPlacement | GameState::GameInProgress
        ) {
            return Err(self.wrong_state());
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                required: MIN_PLAYERS,
                found: self.players.len(),
            });
        }
        self.begin_game();
        Ok(())
    }

    fn begin_game(&mut self) {
        for player in &mut self.players {
            player.reset();
        }
        self.board.setup();
        self.board.set_robber_mode(self.settings.robber_mode);

        let mut deck = DevelopmentCardDeck::standard();
        deck.shuffle(STANDARD_SHUFFLE_PASSES, &mut self.rng);
        self.deck = deck;
        self.dice.clear_log();

        self.clear_turn_scratch();
        self.pending_discards.clear();
        self.pending_robbery.clear();
        self.longest_road = Award::default();
        self.largest_army = Award::default();
        self.winner = None;
        self.turn_index = 0;
        self.turn_number += 1;

        self.game_state = GameState::InitialPlacement;
        self.set_turn_state(PlayerTurnState::PlacingSettlement);
        info!(players = self.players.len(), "new game started");
    }

    /// Take a player out of the session. Their pieces stay on the board and
    /// any award they hold is kept.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), GameError> {
        if self.players.is_empty() {
            return Err(GameError::NotFound(
                "There are no players to remove".to_string(),
            ));
        }
        let index = self.player_index(id)?;
        let was_active = self.active_player_id() == Some(id);

        self.players.remove(index);
        info!(player = id, was_active, state = ?self.game_state, "player left");

        match self.game_state {
            GameState::InitialPlacement => {
                if self.players.len() >= MIN_PLAYERS {
                    info!("restarting initial placement after departure");
                    self.begin_game();
                } else {
                    self.abandon_game();
                }
            }
            GameState::GameInProgress => {
                if self.players.len() < MIN_PLAYERS {
                    self.finish_game(self.players.first().map(|p| p.id));
                    return Ok(());
                }

                self.pending_discards.remove(&id);
                self.pending_robbery.retain(|p| *p != id);

                if was_active {
                    // the next player slides into the vacated slot
                    self.turn_index = index % self.players.len();
                    self.clear_turn_scratch();
                    self.pending_discards.clear();
                    self.pending_robbery.clear();
                    self.turn_number += 1;
                    self.set_turn_state(PlayerTurnState::NeedToRoll);
                } else {
                    if index < self.turn_index {
                        self.turn_index -= 1;
                    }
                    self.trades.cancel_counter(id);
                    self.resume_after_departure();
                }
            }
            GameState::NotStarted | GameState::EndOfGame => {}
        }
        Ok(())
    }

    /// Move on if the departed player was the last one being waited on
    fn resume_after_departure(&mut self) {
        match self.turn_state {
            PlayerTurnState::AnyPlayerSelectingCardsToLose if self.pending_discards.is_empty() => {
                let next = self.after_robber_trigger();
                self.set_turn_state(next);
            }
            PlayerTurnState::SelectingPlayerToStealFrom if self.pending_robbery.is_empty() => {
                self.set_turn_state(PlayerTurnState::TakeAction);
            }
            _ => {}
        }
    }

    fn abandon_game(&mut self) {
        self.clear_turn_scratch();
        self.pending_discards.clear();
        self.pending_robbery.clear();
        self.turn_index = 0;
        self.game_state = GameState::NotStarted;
        self.set_turn_state(PlayerTurnState::None);
        info!("game abandoned, not enough players");
    }

    // ==================== Dice & Robber ====================

    pub fn roll_dice(&mut self, player: PlayerId) -> Result<RollResult, GameError> {
        self.validate(PlayerTurnState::NeedToRoll, player)?;

        let roll = self.dice.roll();
        debug!(player, total = roll.total, dice = ?roll.dice, "dice rolled");

        if roll.total == 7 {
            let threshold = self.settings.card_count_loss_threshold;
            self.pending_discards = self
                .players
                .iter()
                .filter(|p| p.hand_size() >= threshold)
                .map(|p| (p.id, p.hand_size() / 2))
                .filter(|(_, owed)| *owed > 0)
                .collect();

            if self.pending_discards.is_empty() {
                let next = self.after_robber_trigger();
                self.set_turn_state(next);
            } else {
                debug!(owed = ?self.pending_discards, "players must discard");
                self.set_turn_state(PlayerTurnState::AnyPlayerSelectingCardsToLose);
            }
        } else {
            let yields = self.board.resources_for_roll(roll.total);
            for p in &mut self.players {
                if let Some(hand) = yields.get(&p.id) {
                    p.resources.add_hand(hand);
                }
            }
            self.set_turn_state(PlayerTurnState::TakeAction);
        }

        self.current_roll = Some(roll.clone());
        Ok(roll)
    }

    /// Give up the cards owed after a seven. Any player who owes may call it.
    pub fn discard_resources(
        &mut self,
        player: PlayerId,
        to_discard: ResourceHand,
    ) -> Result<(), GameError> {
        self.validate_state(PlayerTurnState::AnyPlayerSelectingCardsToLose)?;
        let index = self.player_index(player)?;

        let Some(&required) = self.pending_discards.get(&player) else {
            return Err(GameError::InvalidDiscard(
                "Discarding resources is not required".to_string(),
            ));
        };
        let selected = to_discard.total();
        if selected != required {
            return Err(GameError::InvalidDiscard(format!(
                "Incorrect number of cards to discard. Selected: {selected}. Required: {required}."
            )));
        }
        if !self.players[index].resources.remove(&to_discard) {
            return Err(GameError::InsufficientResources(
                "You do not have the cards selected to discard".to_string(),
            ));
        }

        self.pending_discards.remove(&player);
        debug!(player, discarded = %to_discard, "cards discarded");

        if self.pending_discards.is_empty() {
            let next = self.after_robber_trigger();
            self.set_turn_state(next);
        }
        Ok(())
    }

    /// Returns the players that can now be robbed
    pub fn move_robber(&mut self, player: PlayerId, hex: HexCoord) -> Result<Vec<PlayerId>, GameError> {
        self.validate(PlayerTurnState::PlacingRobber, player)?;

        let touching = self.board.move_robber(player, hex)?;
        let robbable: Vec<PlayerId> = touching
            .into_iter()
            .filter(|id| *id != player)
            .filter(|id| self.player(*id).is_some_and(|p| p.hand_size() > 0))
            .collect();
        debug!(player, ?hex, ?robbable, "robber moved");

        if robbable.is_empty() {
            self.pending_robbery.clear();
            self.set_turn_state(PlayerTurnState::TakeAction);
        } else {
            self.pending_robbery = robbable.clone();
            self.set_turn_state(PlayerTurnState::SelectingPlayerToStealFrom);
        }
        Ok(robbable)
    }

    /// Take one random card from `victim`
    pub fn steal_from(&mut self, player: PlayerId, victim: PlayerId) -> Result<Resource, GameError> {
        self.validate(PlayerTurnState::SelectingPlayerToStealFrom, player)?;
        let thief_index = self.player_index(player)?;
        let victim_index = self.player_index(victim)?;

        if !self.pending_robbery.contains(&victim) {
            return Err(GameError::InvalidTarget(
                "This player cannot be robbed".to_string(),
            ));
        }

        let stolen = self.players[victim_index]
            .resources
            .remove_random(&mut self.rng)
            .ok_or_else(|| {
                GameError::InvalidTarget("This player has no resource cards to steal".to_string())
            })?;
        self.players[thief_index].resources.add(stolen, 1);
        debug!(thief = player, victim, "resource stolen");

        self.pending_robbery.clear();
        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(stolen)
    }

    // ==================== Trading ====================

    /// Post the active player's offer to everyone, replacing any earlier one
    pub fn offer_trade(
        &mut self,
        player: PlayerId,
        give: ResourceHand,
        receive: ResourceHand,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;

        let offer = TradeOffer::new(player, give, receive);
        if !offer.is_valid() {
            return Err(GameError::trade("Invalid trade offer"));
        }
        if !self.find_player(player)?.resources.contains(&give) {
            return Err(GameError::trade("Cannot afford to create this trade offer"));
        }

        self.trades.open(offer);
        self.set_turn_state(PlayerTurnState::RequestingPlayerTrade);
        Ok(())
    }

    /// A non-active player answers with their own terms
    pub fn send_counter_offer(
        &mut self,
        player: PlayerId,
        give: ResourceHand,
        receive: ResourceHand,
    ) -> Result<(), GameError> {
        self.validate_state(PlayerTurnState::RequestingPlayerTrade)?;
        self.find_player(player)?;
        if self.active_player_id() == Some(player) {
            return Err(GameError::trade("Cannot counter your own offer"));
        }

        let offer = TradeOffer::new(player, give, receive);
        if !offer.is_valid() {
            return Err(GameError::trade("Invalid trade offer"));
        }
        self.trades.counter(offer);
        Ok(())
    }

    pub fn accept_counter_offer(
        &mut self,
        player: PlayerId,
        counter_player: PlayerId,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::RequestingPlayerTrade, player)?;
        self.find_player(counter_player)?;

        let offer = self
            .trades
            .counter_offer(counter_player)
            .cloned()
            .ok_or_else(|| GameError::NotFound("The trade offer does not exist".to_string()))?;

        self.exchange(offer.creator, &offer.give, player, &offer.receive)?;
        info!(active = player, counter_player, "counter-offer accepted");

        self.trades.clear();
        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(())
    }

    /// A non-active player takes the active player's offer as posted
    pub fn accept_active_offer(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.validate_state(PlayerTurnState::RequestingPlayerTrade)?;
        self.find_player(player)?;
        if self.active_player_id() == Some(player) {
            return Err(GameError::trade("Cannot accept your own offer"));
        }

        let offer = self
            .trades
            .active_offer()
            .cloned()
            .ok_or_else(|| {
                GameError::NotFound("There is no active trade offer to accept".to_string())
            })?;

        self.exchange(offer.creator, &offer.give, player, &offer.receive)?;
        info!(active = offer.creator, accepter = player, "trade offer accepted");

        self.trades.clear();
        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(())
    }

    /// The active player withdraws everything; anyone else withdraws their
    /// own counter-offer
    pub fn cancel_trade(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.validate_state(PlayerTurnState::RequestingPlayerTrade)?;

        if self.active_player_id() == Some(player) {
            self.trades.clear();
            self.set_turn_state(PlayerTurnState::TakeAction);
        } else {
            self.find_player(player)?;
            self.trades.cancel_counter(player);
        }
        Ok(())
    }

    /// Trade with the bank at 4:1, or better through the player's ports
    pub fn trade_with_bank(
        &mut self,
        player: PlayerId,
        give: ResourceHand,
        receive: ResourceHand,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        let index = self.player_index(player)?;

        let ports = self.board.ports_for_player(player);
        let offer = TradeOffer::new(player, give, receive);
        if !offer.is_valid_bank_trade(|resource| trade_rate(&ports, resource)) {
            return Err(GameError::trade("Invalid bank trade"));
        }

        let resources = &mut self.players[index].resources;
        if !resources.remove(&give) {
            return Err(GameError::trade("Cannot afford this bank trade"));
        }
        resources.add_hand(&receive);
        debug!(player, gave = %give, received = %receive, "bank trade");
        Ok(())
    }

    /// Swap resources between two players, checking both sides first
    fn exchange(
        &mut self,
        a: PlayerId,
        a_gives: &ResourceHand,
        b: PlayerId,
        b_gives: &ResourceHand,
    ) -> Result<(), GameError> {
        let a_index = self.player_index(a)?;
        let b_index = self.player_index(b)?;
        if a_index == b_index {
            return Err(GameError::trade("Cannot trade with yourself"));
        }

        let (first, second) = pair_mut(&mut self.players, a_index, b_index);
        for (player, gives) in [(&*first, a_gives), (&*second, b_gives)] {
            if !player.resources.contains(gives) {
                return Err(GameError::trade(format!(
                    "{} cannot afford this trade",
                    player.name
                )));
            }
        }

        first.resources.remove(a_gives);
        second.resources.add_hand(a_gives);
        second.resources.remove(b_gives);
        first.resources.add_hand(b_gives);
        Ok(())
    }

    // ==================== Building ====================

    pub fn buy_development_card(&mut self, player: PlayerId) -> Result<DevelopmentCard, GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        let index = self.player_index(player)?;

        if !self.players[index].can_afford(PurchasableItem::DevelopmentCard) {
            return Err(GameError::InsufficientResources(
                "Cannot afford a development card".to_string(),
            ));
        }
        let card = self.deck.draw()?;
        let buyer = &mut self.players[index];
        buyer.purchase(PurchasableItem::DevelopmentCard, false)?;
        buyer.development_cards.push(card);
        debug!(player, remaining = self.deck.len(), "development card bought");
        Ok(card)
    }

    /// Enter road placement. Costs nothing until the road is placed.
    pub fn begin_placing_road(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        self.find_player(player)?
            .check_purchase(PurchasableItem::Road, false)?;
        if self.legal_road_placements(player).is_empty() {
            return Err(GameError::placement(
                "There are no valid locations to build a road",
            ));
        }
        self.set_turn_state(PlayerTurnState::PlacingRoad);
        Ok(())
    }

    /// Enter settlement or city placement. Costs nothing until placed.
    pub fn begin_placing_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        let (item, next) = match kind {
            BuildingKind::Settlement => {
                (PurchasableItem::Settlement, PlayerTurnState::PlacingSettlement)
            }
            BuildingKind::City => (PurchasableItem::City, PlayerTurnState::PlacingCity),
        };
        self.find_player(player)?.check_purchase(item, false)?;
        if self.legal_building_placements(player, kind).is_empty() {
            return Err(GameError::placement(format!(
                "There are no valid locations to build a {}",
                item.name()
            )));
        }
        self.set_turn_state(next);
        Ok(())
    }

    /// Back out of a begun placement
    pub fn cancel_placement(&mut self, player: PlayerId) -> Result<(), GameError> {
        if self.active_player_id() != Some(player) {
            return Err(GameError::OutOfTurn);
        }
        let placing = matches!(
            self.turn_state,
            PlayerTurnState::PlacingRoad
                | PlayerTurnState::PlacingSettlement
                | PlayerTurnState::PlacingCity
        );
        if self.game_state != GameState::GameInProgress || !placing {
            return Err(self.wrong_state());
        }
        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(())
    }

    /// Place a road. Free during initial placement.
    pub fn place_road(&mut self, player: PlayerId, edge: EdgeCoord) -> Result<(), GameError> {
        self.validate(PlayerTurnState::PlacingRoad, player)?;
        let index = self.player_index(player)?;
        let setup = self.is_setup();

        if setup {
            let buildings = self.board.building_count(player, None);
            let roads = self.board.road_count(player);
            if roads >= buildings {
                return Err(GameError::placement(
                    "Cannot place more than 1 road per settlement during the initial placement phase",
                ));
            }
        }

        self.board.validate_road_placement(player, edge, setup)?;
        self.players[index].purchase(PurchasableItem::Road, setup)?;
        if let Err(err) = self.board.place_road(player, edge, setup) {
            panic!("board rejected a road it had just validated at {edge:?}: {err}");
        }
        debug!(player, ?edge, "road placed");
        self.update_longest_road(player);

        if setup {
            let last_player_second_turn =
                self.turn_index + 1 == self.players.len() && self.board.building_count(player, None) == 1;
            if last_player_second_turn {
                // the last player places twice in a row
                self.set_turn_state(PlayerTurnState::PlacingSettlement);
            } else {
                self.advance_turn();
            }
        } else {
            self.set_turn_state(PlayerTurnState::TakeAction);
            self.check_for_victory(player);
        }
        Ok(())
    }

    /// Place a settlement or city. Settlements are free during initial
    /// placement, and the second one collects its starting resources.
    pub fn place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
    ) -> Result<(), GameError> {
        let required = match kind {
            BuildingKind::Settlement => PlayerTurnState::PlacingSettlement,
            BuildingKind::City => PlayerTurnState::PlacingCity,
        };
        self.validate(required, player)?;
        let index = self.player_index(player)?;
        let setup = self.is_setup();

        if setup {
            let placed = self.board.building_count(player, None);
            let allowed = if self.last_player_has_placed() { 2 } else { 1 };
            if placed >= allowed {
                return Err(GameError::placement(
                    "Cannot place any more settlements during the initial placement phase",
                ));
            }
        }

        self.board
            .validate_building_placement(player, kind, point, setup)?;
        let item = match kind {
            BuildingKind::Settlement => PurchasableItem::Settlement,
            BuildingKind::City => PurchasableItem::City,
        };
        self.players[index].purchase(item, setup)?;
        if let Err(err) = self.board.place_building(player, kind, point, setup) {
            panic!("board rejected a {kind:?} it had just validated at {point:?}: {err}");
        }
        debug!(player, ?kind, ?point, "building placed");

        if setup {
            if self.board.building_count(player, None) == 2 {
                let starting = self
                    .board
                    .resources_for_building(point, BuildingKind::Settlement);
                debug!(player, resources = %starting, "starting resources");
                self.players[index].resources.add_hand(&starting);
            }
            self.set_turn_state(PlayerTurnState::PlacingRoad);
        } else {
            self.set_turn_state(PlayerTurnState::TakeAction);
            self.check_for_victory(player);
        }
        Ok(())
    }

    // ==================== Development Cards ====================

    pub fn play_development_card(
        &mut self,
        player: PlayerId,
        card: DevelopmentCard,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        let index = self.player_index(player)?;
        self.players[index].play_development_card(card)?;
        debug!(player, ?card, "development card played");

        match card {
            DevelopmentCard::Knight => {
                self.update_largest_army(player);
                let next = self.after_robber_trigger();
                self.set_turn_state(next);
            }
            DevelopmentCard::Library
            | DevelopmentCard::Chapel
            | DevelopmentCard::Market
            | DevelopmentCard::University
            | DevelopmentCard::GreatHall => {}
            DevelopmentCard::Monopoly => {
                self.set_turn_state(PlayerTurnState::MonopolySelectingResource);
            }
            DevelopmentCard::YearOfPlenty => {
                self.set_turn_state(PlayerTurnState::YearOfPlentySelectingResources);
            }
            DevelopmentCard::RoadBuilding => {
                if self.can_place_free_road(player) {
                    self.free_roads_remaining = 2;
                    self.set_turn_state(PlayerTurnState::RoadBuildingSelectingRoads);
                } else {
                    // nowhere to build: the card is spent with no effect
                    self.free_roads_remaining = 0;
                }
            }
        }

        self.check_for_victory(player);
        Ok(())
    }

    /// Returns how many cards were collected
    pub fn select_monopoly_resource(
        &mut self,
        player: PlayerId,
        resource: Resource,
    ) -> Result<u32, GameError> {
        self.validate(PlayerTurnState::MonopolySelectingResource, player)?;
        let index = self.player_index(player)?;

        let haul: u32 = self
            .players
            .iter_mut()
            .filter(|p| p.id != player)
            .map(|p| p.resources.take_all(resource))
            .sum();
        self.players[index].resources.add(resource, haul);
        debug!(player, %resource, haul, "monopoly");

        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(haul)
    }

    pub fn select_year_of_plenty(
        &mut self,
        player: PlayerId,
        first: Resource,
        second: Resource,
    ) -> Result<(), GameError> {
        self.validate(PlayerTurnState::YearOfPlentySelectingResources, player)?;
        let index = self.player_index(player)?;

        let resources = &mut self.players[index].resources;
        resources.add(first, 1);
        resources.add(second, 1);

        self.set_turn_state(PlayerTurnState::TakeAction);
        Ok(())
    }

    /// Place one of the roads granted by Road Building
    pub fn place_free_road(&mut self, player: PlayerId, edge: EdgeCoord) -> Result<(), GameError> {
        self.validate(PlayerTurnState::RoadBuildingSelectingRoads, player)?;
        let index = self.player_index(player)?;

        self.board.validate_road_placement(player, edge, false)?;
        if let Err(err) = self.players[index].purchase(PurchasableItem::Road, true) {
            self.free_roads_remaining = 0;
            self.set_turn_state(PlayerTurnState::TakeAction);
            return Err(err);
        }
        if let Err(err) = self.board.place_road(player, edge, false) {
            panic!("board rejected a road it had just validated at {edge:?}: {err}");
        }
        debug!(player, ?edge, "free road placed");
        self.update_longest_road(player);

        self.free_roads_remaining = self.free_roads_remaining.saturating_sub(1);
        if self.free_roads_remaining == 0 || !self.can_place_free_road(player) {
            self.free_roads_remaining = 0;
            self.set_turn_state(PlayerTurnState::TakeAction);
        }
        self.check_for_victory(player);
        Ok(())
    }

    fn can_place_free_road(&self, player: PlayerId) -> bool {
        self.player(player).is_some_and(|p| p.roads_available > 0)
            && !self.board.legal_road_placements(player, false).is_empty()
    }

    // ==================== Turn Management ====================

    pub fn end_turn(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.validate(PlayerTurnState::TakeAction, player)?;
        self.clear_turn_scratch();
        self.advance_turn();
        Ok(())
    }

    /// Forcefully end the current turn when its time limit runs out.
    /// Returns the new active player.
    pub fn expire_turn(&mut self) -> Result<PlayerId, GameError> {
        if self.game_state != GameState::GameInProgress {
            return Err(self.wrong_state());
        }
        let expired = self.active_player_id();
        self.clear_turn_scratch();
        self.pending_discards.clear();
        self.pending_robbery.clear();
        self.advance_turn();
        info!(?expired, turn = self.turn_number, "turn expired");
        self.active_player_id().ok_or(GameError::OutOfTurn)
    }

    fn clear_turn_scratch(&mut self) {
        self.trades.clear();
        self.free_roads_remaining = 0;
        self.current_roll = None;
    }

    /// The last seat has at least one building on the board
    fn last_player_has_placed(&self) -> bool {
        self.players
            .last()
            .is_some_and(|p| self.board.building_count(p.id, None) > 0)
    }

    fn advance_turn(&mut self) {
        self.turn_number += 1;
        match self.game_state {
            GameState::GameInProgress => {
                self.turn_index = (self.turn_index + 1) % self.players.len();
                self.set_turn_state(PlayerTurnState::NeedToRoll);
            }
            GameState::InitialPlacement => {
                // snake draft: count up to the last seat, then back down
                if !self.last_player_has_placed() {
                    self.turn_index += 1;
                    self.set_turn_state(PlayerTurnState::PlacingSettlement);
                } else if self.turn_index == 0 {
                    self.game_state = GameState::GameInProgress;
                    self.set_turn_state(PlayerTurnState::NeedToRoll);
                    info!("initial placement complete");
                } else {
                    self.turn_index -= 1;
                    self.set_turn_state(PlayerTurnState::PlacingSettlement);
                }
            }
            GameState::NotStarted | GameState::EndOfGame => {}
        }
        debug!(turn = self.turn_number, active = ?self.active_player_id(), "turn advanced");
    }

    // ==================== Awards & Victory ====================

    fn update_longest_road(&mut self, player: PlayerId) {
        let length = self.board.road_length(player);
        let previous = self.longest_road.holder;
        if self
            .longest_road
            .consider(player, length, self.settings.minimum_longest_road)
            && previous != Some(player)
        {
            info!(player, length, ?previous, "longest road changed hands");
        }
    }

    fn update_largest_army(&mut self, player: PlayerId) {
        let Some(size) = self.player(player).map(Player::army_size) else {
            return;
        };
        let previous = self.largest_army.holder;
        if self
            .largest_army
            .consider(player, size, MINIMUM_LARGEST_ARMY)
            && previous != Some(player)
        {
            info!(player, knights = size, ?previous, "largest army changed hands");
        }
    }

    fn check_for_victory(&mut self, player: PlayerId) {
        if self.game_state != GameState::GameInProgress {
            return;
        }
        let score = self.score(player);
        if score >= self.settings.score_needed_to_win {
            info!(player, score, "player won");
            self.finish_game(Some(player));
        }
    }

    fn finish_game(&mut self, winner: Option<PlayerId>) {
        self.winner = winner;
        self.clear_turn_scratch();
        self.pending_discards.clear();
        self.pending_robbery.clear();
        self.game_state = GameState::EndOfGame;
        self.set_turn_state(PlayerTurnState::None);
        info!(?winner, "game over");
    }

    // ==================== Helpers ====================

    /// The active player may take an action requiring `required`
    fn validate(&self, required: PlayerTurnState, player: PlayerId) -> Result<(), GameError> {
        if self.active_player_id() != Some(player) {
            return Err(GameError::OutOfTurn);
        }
        self.validate_state(required)
    }

    /// Anyone may take an action requiring `required`
    fn validate_state(&self, required: PlayerTurnState) -> Result<(), GameError> {
        if self.turn_state != required || !is_allowed(self.game_state, required) {
            return Err(self.wrong_state());
        }
        Ok(())
    }

    fn wrong_state(&self) -> GameError {
        GameError::WrongState {
            game: self.game_state,
            turn: self.turn_state,
        }
    }

    fn after_robber_trigger(&self) -> PlayerTurnState {
        match self.settings.robber_mode {
            RobberMode::None => PlayerTurnState::TakeAction,
            RobberMode::Normal => PlayerTurnState::PlacingRobber,
        }
    }

    fn set_turn_state(&mut self, next: PlayerTurnState) {
        debug_assert!(
            is_allowed(self.game_state, next),
            "{next:?} is not reachable in {:?}",
            self.game_state
        );
        debug!(from = ?self.turn_state, to = ?next, game = ?self.game_state, "turn state");
        self.turn_state = next;
    }

    fn player_index(&self, id: PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GameError::unknown_player(id))
    }

    fn find_player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.player(id).ok_or_else(|| GameError::unknown_player(id))
    }
}

/// Two distinct players borrowed mutably at once
fn pair_mut(players: &mut [Player], a: usize, b: usize) -> (&mut Player, &mut Player) {
    if a < b {
        let (left, right) = players.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = players.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
