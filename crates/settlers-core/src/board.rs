//! The board collaborator: what the rules engine needs from a game board.
//!
//! The engine never inspects topology itself. It asks a [`Board`] whether a
//! placement is legal, tells it to place pieces and move the robber, and
//! asks what a roll or a new building produces. [`crate::HexBoard`] is the
//! reference implementation.

use crate::error::GameError;
use crate::hex::{EdgeCoord, HexCoord, PointCoord};
use crate::resources::{Resource, ResourceHand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Player identifier, unique for the life of a session
pub type PlayerId = u32;

/// What can stand on a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// 1 VP, 1 resource per adjacent tile
    Settlement,
    /// 2 VP, 2 resources per adjacent tile
    City,
}

impl BuildingKind {
    pub fn victory_points(&self) -> u32 {
        match self {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }

    pub fn resource_multiplier(&self) -> u32 {
        self.victory_points()
    }
}

/// Whether the robber takes part in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RobberMode {
    /// The robber never moves and blocks nothing
    None,
    #[default]
    Normal,
}

/// Harbor trading bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Port {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Port {
    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            Port::Generic => 3,
            Port::Specific(_) => 2,
        }
    }
}

/// Rate without any port
pub const BANK_RATE: u32 = 4;

/// Best bank rate for `resource` given the ports a player can use
pub fn trade_rate(ports: &[Port], resource: Resource) -> u32 {
    ports
        .iter()
        .filter(|port| match port {
            Port::Generic => true,
            Port::Specific(r) => *r == resource,
        })
        .map(Port::rate)
        .min()
        .unwrap_or(BANK_RATE)
}

/// Board topology, placement legality and production.
///
/// Placement methods take `free_setup` to select the initial-placement rules
/// (no road connectivity required for settlements, roads must attach to the
/// newest settlement).
pub trait Board {
    /// Prepare for a new game, clearing all pieces
    fn setup(&mut self);

    fn set_robber_mode(&mut self, mode: RobberMode);

    /// Buildings owned by `player`, optionally of one kind only
    fn building_count(&self, player: PlayerId, kind: Option<BuildingKind>) -> u32;

    fn road_count(&self, player: PlayerId) -> u32;

    /// Length of the longest continuous trail of `player`'s roads
    fn road_length(&self, player: PlayerId) -> u32;

    fn validate_road_placement(
        &self,
        player: PlayerId,
        edge: EdgeCoord,
        free_setup: bool,
    ) -> Result<(), GameError>;

    fn validate_building_placement(
        &self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
        free_setup: bool,
    ) -> Result<(), GameError>;

    fn place_road(
        &mut self,
        player: PlayerId,
        edge: EdgeCoord,
        free_setup: bool,
    ) -> Result<(), GameError>;

    fn place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        point: PointCoord,
        free_setup: bool,
    ) -> Result<(), GameError>;

    /// Move the robber and report every player with a building touching
    /// the new hex
    fn move_robber(&mut self, player: PlayerId, hex: HexCoord) -> Result<Vec<PlayerId>, GameError>;

    fn resources_for_roll(&self, total: u32) -> HashMap<PlayerId, ResourceHand>;

    /// What a building at `point` would produce once from each adjacent tile
    fn resources_for_building(&self, point: PointCoord, kind: BuildingKind) -> ResourceHand;

    fn ports_for_player(&self, player: PlayerId) -> Vec<Port>;

    fn all_edges(&self) -> Vec<EdgeCoord>;

    fn all_points(&self) -> Vec<PointCoord>;

    /// Every edge where `player` may build a road
    fn legal_road_placements(&self, player: PlayerId, free_setup: bool) -> Vec<EdgeCoord> {
        self.all_edges()
            .into_iter()
            .filter(|edge| self.validate_road_placement(player, *edge, free_setup).is_ok())
            .collect()
    }

    /// Every point where `player` may put a building of `kind`
    fn legal_building_placements(
        &self,
        player: PlayerId,
        kind: BuildingKind,
        free_setup: bool,
    ) -> Vec<PointCoord> {
        self.all_points()
            .into_iter()
            .filter(|point| {
                self.validate_building_placement(player, kind, *point, free_setup)
                    .is_ok()
            })
            .collect()
    }
}
