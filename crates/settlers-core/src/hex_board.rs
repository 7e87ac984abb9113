//! Reference hex board implementing the [`Board`] contract.
//!
//! This module contains:
//! - Tile types and the standard 19 tile layout
//! - Buildings, roads and ports keyed by point and edge coordinates
//! - Placement validation (distance rule, road connectivity, setup roads)
//! - Production, robber blocking and longest-road search

use crate::board::{Board, BuildingKind, PlayerId, Port, RobberMode};
use crate::error::GameError;
use crate::hex::{EdgeCoord, HexCoord, PointCoord};
use crate::resources::{Resource, ResourceHand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Type of land tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// No production, the robber starts here
    Desert,
}

/// A single land tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: HexCoord,
    pub tile_type: TileType,
    /// Total that triggers production (None for the desert)
    pub dice_number: Option<u32>,
}

impl Tile {
    pub fn new_resource(coord: HexCoord, resource: Resource, dice_number: u32) -> Self {
        Self {
            coord,
            tile_type: TileType::Resource(resource),
            dice_number: Some(dice_number),
        }
    }

    pub fn desert(coord: HexCoord) -> Self {
        Self {
            coord,
            tile_type: TileType::Desert,
            dice_number: None,
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        match self.tile_type {
            TileType::Resource(r) => Some(r),
            TileType::Desert => None,
        }
    }
}

/// A building standing on a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub owner: PlayerId,
    pub kind: BuildingKind,
}

/// A port on a coastal edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPlacement {
    pub edge: EdgeCoord,
    pub port: Port,
}

/// The standard 19 land hexes: center, inner ring, outer ring
const STANDARD_LAND: [(i32, i32); 19] = [
    (0, 0),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (2, 0),
    (2, -1),
    (2, -2),
    (1, -2),
    (0, -2),
    (-1, -1),
    (-2, 0),
    (-2, 1),
    (-2, 2),
    (-1, 2),
    (0, 2),
    (1, 1),
];

/// One number per producing tile
const STANDARD_NUMBERS: [u32; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexBoard {
    tiles: HashMap<HexCoord, Tile>,
    buildings: HashMap<PointCoord, Building>,
    roads: HashMap<EdgeCoord, PlayerId>,
    ports: Vec<PortPlacement>,
    robber: Option<HexCoord>,
    robber_mode: RobberMode,
}

impl HexBoard {
    /// A board with an explicit layout. The robber starts on the first desert.
    pub fn new(tiles: Vec<Tile>, ports: Vec<PortPlacement>) -> Self {
        let mut board = Self {
            tiles: tiles.into_iter().map(|t| (t.coord, t)).collect(),
            buildings: HashMap::new(),
            roads: HashMap::new(),
            ports,
            robber: None,
            robber_mode: RobberMode::Normal,
        };
        board.robber = board.desert();
        board
    }

    /// The standard layout with tiles, numbers and ports shuffled by `seed`
    pub fn standard(seed: u64) -> Self {
        Self::standard_with_rng(&mut StdRng::seed_from_u64(seed))
    }

    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let coords: Vec<HexCoord> = STANDARD_LAND
            .iter()
            .map(|(q, r)| HexCoord::new(*q, *r))
            .collect();

        // 4 wood, 4 wheat, 4 sheep, 3 ore, 3 brick, 1 desert
        let mut kinds: Vec<Option<Resource>> = [
            (Resource::Wood, 4),
            (Resource::Wheat, 4),
            (Resource::Sheep, 4),
            (Resource::Ore, 3),
            (Resource::Brick, 3),
        ]
        .iter()
        .flat_map(|(resource, count)| std::iter::repeat(Some(*resource)).take(*count))
        .chain(std::iter::once(None))
        .collect();
        kinds.shuffle(rng);

        let producing: Vec<HexCoord> = coords
            .iter()
            .zip(&kinds)
            .filter(|(_, kind)| kind.is_some())
            .map(|(coord, _)| *coord)
            .collect();
        let numbers = assign_numbers(&producing, rng);

        let mut numbers = numbers.into_iter();
        let tiles = coords
            .iter()
            .zip(kinds)
            .map(|(coord, kind)| match kind {
                Some(resource) => {
                    Tile::new_resource(*coord, resource, numbers.next().unwrap_or_default())
                }
                None => Tile::desert(*coord),
            })
            .collect();

        let mut board = Self::new(tiles, Vec::new());
        board.ports = board.standard_ports(rng);
        board
    }

    fn desert(&self) -> Option<HexCoord> {
        let mut deserts: Vec<HexCoord> = self
            .tiles
            .values()
            .filter(|t| t.tile_type == TileType::Desert)
            .map(|t| t.coord)
            .collect();
        deserts.sort();
        deserts.first().copied()
    }

    /// 4 generic and 5 specific ports spread evenly around the coast
    fn standard_ports<R: Rng>(&self, rng: &mut R) -> Vec<PortPlacement> {
        let mut kinds: Vec<Port> = std::iter::repeat(Port::Generic)
            .take(4)
            .chain(Resource::ALL.iter().map(|r| Port::Specific(*r)))
            .collect();
        kinds.shuffle(rng);

        let mut coast = self.coastal_edges();
        coast.sort_by(|a, b| {
            let angle = |e: &EdgeCoord| {
                let (x, y) = e.to_pixel(1.0);
                y.atan2(x)
            };
            angle(a).total_cmp(&angle(b))
        });
        if coast.is_empty() {
            return Vec::new();
        }

        let offset = rng.gen_range(0..coast.len());
        let spacing = coast.len() as f64 / kinds.len() as f64;
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, port)| {
                let index = (offset + (i as f64 * spacing) as usize) % coast.len();
                PortPlacement {
                    edge: coast[index],
                    port,
                }
            })
            .collect()
    }

    /// Edges between a land tile and the sea
    fn coastal_edges(&self) -> Vec<EdgeCoord> {
        self.land_edges()
            .into_iter()
            .filter(|edge| edge.touching_hexes().iter().any(|h| !self.is_land(h)))
            .collect()
    }

    // ==================== Query Methods ====================

    pub fn tile(&self, coord: &HexCoord) -> Option<&Tile> {
        self.tiles.get(coord)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn building(&self, point: &PointCoord) -> Option<Building> {
        self.buildings.get(point).copied()
    }

    pub fn road_owner(&self, edge: &EdgeCoord) -> Option<PlayerId> {
        self.roads.get(edge).copied()
    }

    pub fn ports(&self) -> &[PortPlacement] {
        &self.ports
    }

    pub fn robber_location(&self) -> Option<HexCoord> {
        self.robber
    }

    fn is_land(&self, hex: &HexCoord) -> bool {
        self.tiles.contains_key(hex)
    }

    fn land_points(&self) -> BTreeSet<PointCoord> {
        self.tiles.keys().flat_map(|h| h.points()).collect()
    }

    fn land_edges(&self) -> BTreeSet<EdgeCoord> {
        self.tiles.keys().flat_map(|h| h.edges()).collect()
    }

    fn is_land_point(&self, point: &PointCoord) -> bool {
        point.touching_hexes().iter().any(|h| self.is_land(h))
    }

    fn is_land_edge(&self, edge: &EdgeCoord) -> bool {
        edge.touching_hexes().iter().any(|h| self.is_land(h))
    }

    /// No building on this point or any neighboring point
    pub fn satisfies_distance_rule(&self, point: &PointCoord) -> bool {
        !self.buildings.contains_key(point)
            && point
                .adjacent_points()
                .iter()
                .all(|p| !self.buildings.contains_key(p))
    }

    fn has_road(&self, player: PlayerId, edge: &EdgeCoord) -> bool {
        self.road_owner(edge) == Some(player)
    }

    fn owned_by_opponent(&self, player: PlayerId, point: &PointCoord) -> bool {
        self.buildings
            .get(point)
            .is_some_and(|b| b.owner != player)
    }

    /// Whether `edge` attaches to `player`'s network. Opponent buildings cut
    /// the network at their point.
    fn is_connected_to_network(&self, player: PlayerId, edge: &EdgeCoord) -> bool {
        edge.endpoints().iter().any(|endpoint| {
            match self.buildings.get(endpoint) {
                Some(b) if b.owner == player => return true,
                Some(_) => return false,
                None => {}
            }
            endpoint
                .touching_edges()
                .iter()
                .any(|e| e != edge && self.has_road(player, e))
        })
    }

    /// The point of a settlement of `player` that no road of theirs touches yet
    fn unroaded_settlement(&self, player: PlayerId) -> Option<PointCoord> {
        self.buildings
            .iter()
            .filter(|(_, b)| b.owner == player)
            .map(|(point, _)| *point)
            .find(|point| {
                !point
                    .touching_edges()
                    .iter()
                    .any(|e| self.has_road(player, e))
            })
    }

    // ==================== Longest Road Calculation ====================

    fn longest_trail_from(
        &self,
        player: PlayerId,
        point: PointCoord,
        visited: &mut HashSet<EdgeCoord>,
    ) -> u32 {
        let mut longest = 0;
        for edge in point.touching_edges() {
            if !self.has_road(player, &edge) || visited.contains(&edge) {
                continue;
            }
            let next = edge.other_endpoint(&point);
            visited.insert(edge);
            // an opponent building ends the trail
            let onward = if self.owned_by_opponent(player, &next) {
                0
            } else {
                self.longest_trail_from(player, next, visited)
            };
            visited.remove(&edge);
            longest = longest.max(1 + onward);
        }
        longest
    }

    /// Client-friendly copy with arrays instead of maps
    pub fn view(&self) -> BoardView {
        let mut tiles: Vec<Tile> = self.tiles().cloned().collect();
        tiles.sort_by_key(|t| t.coord);
        let mut buildings: Vec<BuildingView> = self
            .buildings
            .iter()
            .map(|(point, b)| BuildingView {
                point: *point,
                owner: b.owner,
                kind: b.kind,
            })
            .collect();
        buildings.sort_by_key(|b| b.point);
        let mut roads: Vec<RoadView> = self
            .roads
            .iter()
            .map(|(edge, owner)| RoadView {
                edge: *edge,
                owner: *owner,
            })
            .collect();
        roads.sort_by_key(|r| r.edge);

        BoardView {
            tiles,
            buildings,
            roads,
            ports: self.ports.clone(),
            robber: self.robber,
        }
    }
}

/// Shuffle numbers onto producing tiles, retrying to keep 6 and 8 apart
fn assign_numbers<R: Rng>(producing: &[HexCoord], rng: &mut R) -> Vec<u32> {
    const MAX_ATTEMPTS: usize = 100;

    let mut numbers = STANDARD_NUMBERS.to_vec();
    for _ in 0..MAX_ATTEMPTS {
        numbers.shuffle(rng);
        if red_numbers_apart(producing, &numbers) {
            break;
        }
    }
    numbers
}

fn red_numbers_apart(producing: &[HexCoord], numbers: &[u32]) -> bool {
    let red: Vec<HexCoord> = producing
        .iter()
        .zip(numbers)
        .filter(|(_, n)| **n == 6 || **n == 8)
        .map(|(coord, _)| *coord)
        .collect();
    red.iter()
        .all(|a| red.iter().all(|b| a == b || a.distance_to(b) > 1))
}

impl Default for HexBoard {
    fn default() -> Self {
        Self::standard_with_rng(&mut StdRng::from_entropy())
    }
}

impl Board for HexBoard {
    fn setup(&mut self) {
        self.buildings.clear();
        self.roads.clear();
        self.robber = self.desert();
    }

    fn set_robber_mode(&mut self, mode: RobberMode) {
        self.robber_mode = mode;
    }

    fn building_count(&self, player: PlayerId, kind: Option<BuildingKind>) -> u32 {
        self.buildings
            .values()
            .filter(|b| b.owner == player && kind.map_or(true, |k| k == b.kind))
            .count() as u32
    }

    fn road_count(&self, player: PlayerId) -> u32 {
        self.roads.values().filter(|owner| **owner == player).count() as u32
    }

    fn road_length(&self, player: PlayerId) -> u32 {
        let mut visited = HashSet::new();
        self.roads
            .iter()
            .filter(|(_, owner)| **owner == player)
            .flat_map(|(edge, _)| edge.endpoints())
            .map(|start| self.longest_trail_from(player, start, &mut visited))
            .max()
            .unwrap_or(0)
    }

    fn validate_road_placement(
        &self,
        player: PlayerId,
        edge: EdgeCoord,
        free_setup: bool,
    ) -> Result<(), GameError> {
        if !self.is_land_edge(&edge) {
            return Err(GameError::placement("Roads must border land"));
        }
        if self.road_owner(&edge).is_some() {
            return Err(GameError::placement("There is already a road there"));
        }

        if free_setup {
            let Some(settlement) = self.unroaded_settlement(player) else {
                return Err(GameError::placement("Place a settlement before its road"));
            };
            if !edge.touches(&settlement) {
                return Err(GameError::placement(
                    "The road must touch the settlement just placed",
                ));
            }
            return Ok(());
        }

        if !self.is_connected_to_network(player, &edge) {
            return Err(GameError::placement(
                "Roads must connect to your roads or buildings",
            ));
        }
        Ok(())
    }

    fn validate_building_placement(
        &self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
        free_setup: bool,
    ) -> Result<(), GameError> {
        if !self.is_land_point(&point) {
            return Err(GameError::placement("Buildings must touch land"));
        }

        match kind {
            BuildingKind::Settlement => {
                if !self.satisfies_distance_rule(&point) {
                    return Err(GameError::placement(
                        "Too close to another building",
                    ));
                }
                let on_road = point
                    .touching_edges()
                    .iter()
                    .any(|e| self.has_road(player, e));
                if !free_setup && !on_road {
                    return Err(GameError::placement(
                        "Settlements must be next to one of your roads",
                    ));
                }
                Ok(())
            }
            BuildingKind::City => {
                if free_setup {
                    return Err(GameError::placement("Cities cannot be placed during setup"));
                }
                match self.buildings.get(&point) {
                    Some(Building {
                        owner,
                        kind: BuildingKind::Settlement,
                    }) if *owner == player => Ok(()),
                    _ => Err(GameError::placement(
                        "Cities must replace one of your settlements",
                    )),
                }
            }
        }
    }

    fn place_road(
        &mut self,
        player: PlayerId,
        edge: EdgeCoord,
        free_setup: bool,
    ) -> Result<(), GameError> {
        self.validate_road_placement(player, edge, free_setup)?;
        self.roads.insert(edge, player);
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
        self.buildings.insert(
            point,
            Building {
                owner: player,
                kind,
            },
        );
        Ok(())
    }

    fn move_robber(&mut self, _player: PlayerId, hex: HexCoord) -> Result<Vec<PlayerId>, GameError> {
        if self.robber_mode == RobberMode::None {
            return Err(GameError::placement("The robber is not in play"));
        }
        if !self.is_land(&hex) {
            return Err(GameError::placement("The robber must be placed on land"));
        }
        if self.robber == Some(hex) {
            return Err(GameError::placement("The robber must move to a new tile"));
        }
        self.robber = Some(hex);

        let touching: BTreeSet<PlayerId> = hex
            .points()
            .iter()
            .filter_map(|p| self.buildings.get(p))
            .map(|b| b.owner)
            .collect();
        Ok(touching.into_iter().collect())
    }

    fn resources_for_roll(&self, total: u32) -> HashMap<PlayerId, ResourceHand> {
        let mut distribution: HashMap<PlayerId, ResourceHand> = HashMap::new();

        for tile in self.tiles() {
            if tile.dice_number != Some(total) {
                continue;
            }
            if self.robber_mode == RobberMode::Normal && self.robber == Some(tile.coord) {
                continue;
            }
            let Some(resource) = tile.resource() else {
                continue;
            };

            for point in tile.coord.points() {
                if let Some(building) = self.buildings.get(&point) {
                    distribution
                        .entry(building.owner)
                        .or_default()
                        .add(resource, building.kind.resource_multiplier());
                }
            }
        }

        distribution
    }

    fn resources_for_building(&self, point: PointCoord, kind: BuildingKind) -> ResourceHand {
        let mut hand = ResourceHand::new();
        for resource in point
            .touching_hexes()
            .iter()
            .filter_map(|h| self.tiles.get(h))
            .filter_map(Tile::resource)
        {
            hand.add(resource, kind.resource_multiplier());
        }
        hand
    }

    fn ports_for_player(&self, player: PlayerId) -> Vec<Port> {
        self.ports
            .iter()
            .filter(|placement| {
                placement
                    .edge
                    .endpoints()
                    .iter()
                    .any(|p| self.buildings.get(p).is_some_and(|b| b.owner == player))
            })
            .map(|placement| placement.port)
            .collect()
    }

    fn all_edges(&self) -> Vec<EdgeCoord> {
        self.land_edges().into_iter().collect()
    }

    fn all_points(&self) -> Vec<PointCoord> {
        self.land_points().into_iter().collect()
    }
}

/// JSON-friendly board representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub tiles: Vec<Tile>,
    pub buildings: Vec<BuildingView>,
    pub roads: Vec<RoadView>,
    pub ports: Vec<PortPlacement>,
    pub robber: Option<HexCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingView {
    pub point: PointCoord,
    pub owner: PlayerId,
    pub kind: BuildingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadView {
    pub edge: EdgeCoord,
    pub owner: PlayerId,
}
