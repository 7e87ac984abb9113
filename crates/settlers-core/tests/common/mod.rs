//! Shared fixtures for the integration tests.
//!
//! [`ScriptedBoard`] accepts any unoccupied placement and reports whatever
//! road lengths, roll yields and robber neighbors the test scripts into it.
//! The test keeps a [`Script`] handle while the game owns the board.

#![allow(dead_code)]

use settlers_core::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Script {
    pub road_lengths: HashMap<PlayerId, u32>,
    pub yields: HashMap<u32, HashMap<PlayerId, ResourceHand>>,
    pub starting_resources: ResourceHand,
    pub robber_neighbors: Vec<PlayerId>,
    pub ports: HashMap<PlayerId, Vec<Port>>,
    pub buildings: HashMap<PointCoord, (PlayerId, BuildingKind)>,
    pub roads: HashMap<EdgeCoord, PlayerId>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBoard {
    pub script: Rc<RefCell<Script>>,
}

impl ScriptedBoard {
    pub fn new() -> (Self, Rc<RefCell<Script>>) {
        let board = Self::default();
        let handle = Rc::clone(&board.script);
        (board, handle)
    }
}

/// Hexes within two steps of the origin
fn area() -> Vec<HexCoord> {
    let origin = HexCoord::new(0, 0);
    let mut hexes = Vec::new();
    for q in -2..=2 {
        for r in -2..=2 {
            let hex = HexCoord::new(q, r);
            if origin.distance_to(&hex) <= 2 {
                hexes.push(hex);
            }
        }
    }
    hexes
}

impl Board for ScriptedBoard {
    fn setup(&mut self) {
        let mut script = self.script.borrow_mut();
        script.buildings.clear();
        script.roads.clear();
    }

    fn set_robber_mode(&mut self, _mode: RobberMode) {}

    fn building_count(&self, player: PlayerId, kind: Option<BuildingKind>) -> u32 {
        self.script
            .borrow()
            .buildings
            .values()
            .filter(|(owner, k)| *owner == player && kind.map_or(true, |kind| kind == *k))
            .count() as u32
    }

    fn road_count(&self, player: PlayerId) -> u32 {
        self.script
            .borrow()
            .roads
            .values()
            .filter(|owner| **owner == player)
            .count() as u32
    }

    fn road_length(&self, player: PlayerId) -> u32 {
        let script = self.script.borrow();
        script
            .road_lengths
            .get(&player)
            .copied()
            .unwrap_or_else(|| script.roads.values().filter(|o| **o == player).count() as u32)
    }

    fn validate_road_placement(
        &self,
        _player: PlayerId,
        edge: EdgeCoord,
        _free_setup: bool,
    ) -> Result<(), GameError> {
        if self.script.borrow().roads.contains_key(&edge) {
            return Err(GameError::InvalidPlacement("Edge is taken".to_string()));
        }
        Ok(())
    }

    fn validate_building_placement(
        &self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
        _free_setup: bool,
    ) -> Result<(), GameError> {
        let existing = self.script.borrow().buildings.get(&point).copied();
        match (kind, existing) {
            (BuildingKind::Settlement, None) => Ok(()),
            (BuildingKind::City, Some((owner, BuildingKind::Settlement))) if owner == player => {
                Ok(())
            }
            _ => Err(GameError::InvalidPlacement("Point is not available".to_string())),
        }
    }

    fn place_road(
        &mut self,
        player: PlayerId,
        edge: EdgeCoord,
        free_setup: bool,
    ) -> Result<(), GameError> {
        self.validate_road_placement(player, edge, free_setup)?;
        self.script.borrow_mut().roads.insert(edge, player);
        Ok(())
    }

    fn place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
        free_setup: bool,
    ) -> Result<(), GameError> {
        self.validate_building_placement(player, kind, point, free_setup)?;
        self.script.borrow_mut().buildings.insert(point, (player, kind));
        Ok(())
    }

    fn move_robber(&mut self, _player: PlayerId, _hex: HexCoord) -> Result<Vec<PlayerId>, GameError> {
        Ok(self.script.borrow().robber_neighbors.clone())
    }

    fn resources_for_roll(&self, total: u32) -> HashMap<PlayerId, ResourceHand> {
        self.script
            .borrow()
            .yields
            .get(&total)
            .cloned()
            .unwrap_or_default()
    }

    fn resources_for_building(&self, _point: PointCoord, _kind: BuildingKind) -> ResourceHand {
        self.script.borrow().starting_resources
    }

    fn ports_for_player(&self, player: PlayerId) -> Vec<Port> {
        self.script
            .borrow()
            .ports
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    fn all_edges(&self) -> Vec<EdgeCoord> {
        let mut edges: Vec<EdgeCoord> = area().iter().flat_map(|h| h.edges()).collect();
        edges.sort();
        edges.dedup();
        edges
    }

    fn all_points(&self) -> Vec<PointCoord> {
        let mut points: Vec<PointCoord> = area().iter().flat_map(|h| h.points()).collect();
        points.sort();
        points.dedup();
        points
    }
}

pub type ScriptedGame = GameManager<ScriptedBoard>;

/// A started game with `players` seated and a fresh script handle
pub fn scripted_game(players: usize, settings: GameSettings) -> (ScriptedGame, Rc<RefCell<Script>>) {
    let (board, script) = ScriptedBoard::new();
    let mut game = GameManager::with_seed(board, settings, 17);
    for i in 0..players {
        game.add_player(format!("Player {i}")).expect("seat player");
    }
    game.start_new_game().expect("start game");
    (game, script)
}

/// Snake draft with the first free spots. Returns who placed each settlement.
pub fn complete_setup<B: Board>(game: &mut GameManager<B>) -> Vec<PlayerId> {
    let mut order = Vec::new();
    while game.game_state() == GameState::InitialPlacement {
        let player = game.active_player_id().expect("active player");
        let point = game.legal_building_placements(player, BuildingKind::Settlement)[0];
        game.place_building(player, BuildingKind::Settlement, point)
            .expect("setup settlement");
        order.push(player);
        let edge = game.legal_road_placements(player)[0];
        game.place_road(player, edge).expect("setup road");
    }
    order
}

/// Force every roll to `total`
pub fn rig_dice<B: Board>(game: &mut GameManager<B>, total: u32) {
    let dice = game.dice_mut();
    dice.clear_exclusions();
    for t in dice.range() {
        if t != total {
            dice.exclude(t).expect("exclude total");
        }
    }
}

/// Script a roll total that pays `hand` to `player`, then roll it
pub fn roll_paying(
    game: &mut ScriptedGame,
    script: &Rc<RefCell<Script>>,
    player: PlayerId,
    total: u32,
    hand: ResourceHand,
) {
    script
        .borrow_mut()
        .yields
        .entry(total)
        .or_default()
        .insert(player, hand);
    rig_dice(game, total);
    let active = game.active_player_id().expect("active player");
    game.roll_dice(active).expect("roll");
    script.borrow_mut().yields.remove(&total);
}
