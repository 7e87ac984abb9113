//! Hex coordinate system using axial coordinates (q, r).
//!
//! - `HexCoord`: identifies individual hex tiles
//! - `PointCoord`: a corner where settlements and cities stand, named by the
//!   three hexes that meet there
//! - `EdgeCoord`: a side where roads are built, named by the two hexes it
//!   separates
//!
//! Points and edges keep their hexes sorted, so every corner and side has
//! exactly one representation no matter which tile it was reached from.

use serde::{Deserialize, Serialize};

/// Axial offsets of the six neighbors, counter-clockwise from East
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Axial coordinate for hex grid.
///
/// - `q` increases going east
/// - `r` increases going southeast
/// - the implicit `s` satisfies q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    fn step(&self, direction: usize) -> HexCoord {
        let (dq, dr) = DIRECTIONS[direction % 6];
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// The six neighboring hexes, counter-clockwise from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        std::array::from_fn(|i| self.step(i))
    }

    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// The six corners of this hex
    pub fn points(&self) -> [PointCoord; 6] {
        std::array::from_fn(|i| PointCoord::new(*self, self.step(i), self.step(i + 1)))
    }

    /// The six sides of this hex
    pub fn edges(&self) -> [EdgeCoord; 6] {
        std::array::from_fn(|i| EdgeCoord::new(*self, self.step(i)))
    }

    /// Center in pixel space, pointy-top orientation
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }

    fn offset_to(&self, other: &HexCoord) -> Option<usize> {
        let delta = (other.q - self.q, other.r - self.r);
        DIRECTIONS.iter().position(|d| *d == delta)
    }
}

/// Corner where three hexes meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointCoord {
    hexes: [HexCoord; 3],
}

impl PointCoord {
    /// The corner shared by three mutually adjacent hexes, in any order
    pub fn new(a: HexCoord, b: HexCoord, c: HexCoord) -> Self {
        let mut hexes = [a, b, c];
        hexes.sort();
        Self { hexes }
    }

    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        self.hexes
    }

    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        let [a, b, c] = self.hexes;
        [EdgeCoord::new(a, b), EdgeCoord::new(b, c), EdgeCoord::new(a, c)]
    }

    /// Corners one edge away
    pub fn adjacent_points(&self) -> [PointCoord; 3] {
        self.touching_edges().map(|edge| edge.other_endpoint(self))
    }

    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let (x, y) = self
            .hexes
            .iter()
            .map(|h| h.to_pixel(hex_size))
            .fold((0.0, 0.0), |(x, y), (hx, hy)| (x + hx, y + hy));
        (x / 3.0, y / 3.0)
    }
}

/// Side shared by two adjacent hexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeCoord {
    hexes: [HexCoord; 2],
}

impl EdgeCoord {
    pub fn new(a: HexCoord, b: HexCoord) -> Self {
        let mut hexes = [a, b];
        hexes.sort();
        Self { hexes }
    }

    pub fn touching_hexes(&self) -> [HexCoord; 2] {
        self.hexes
    }

    /// The two corners at the ends of this side
    pub fn endpoints(&self) -> [PointCoord; 2] {
        let [a, b] = self.hexes;
        // hexes that are not adjacent name no real edge; fall back to a
        // degenerate pair so the lookup simply never matches
        let Some(i) = a.offset_to(&b) else {
            return [PointCoord::new(a, b, a), PointCoord::new(a, b, b)];
        };
        [
            PointCoord::new(a, b, a.step(i + 5)),
            PointCoord::new(a, b, a.step(i + 1)),
        ]
    }

    /// The endpoint that is not `point`
    pub fn other_endpoint(&self, point: &PointCoord) -> PointCoord {
        let [first, second] = self.endpoints();
        if first == *point {
            second
        } else {
            first
        }
    }

    pub fn touches(&self, point: &PointCoord) -> bool {
        self.endpoints().contains(point)
    }

    /// Midpoint in pixel space
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let [p1, p2] = self.endpoints();
        let (x1, y1) = p1.to_pixel(hex_size);
        let (x2, y2) = p2.to_pixel(hex_size);
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let unique: HashSet<_> = center.neighbors().into_iter().collect();
        assert_eq!(unique.len(), 6);
        for neighbor in &unique {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance_to(&HexCoord::new(2, -1)), 2);
        assert_eq!(a.distance_to(&HexCoord::new(-3, 3)), 3);
    }

    #[test]
    fn test_point_is_order_independent() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, 0);
        let c = HexCoord::new(1, -1);
        assert_eq!(PointCoord::new(a, b, c), PointCoord::new(c, a, b));
    }

    #[test]
    fn test_neighboring_hexes_share_two_points() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, 0);
        let shared: HashSet<_> = a
            .points()
            .into_iter()
            .filter(|p| b.points().contains(p))
            .collect();
        assert_eq!(shared.len(), 2);
        let edge: HashSet<_> = EdgeCoord::new(a, b).endpoints().into_iter().collect();
        assert_eq!(shared, edge);
    }

    #[test]
    fn test_point_adjacency() {
        let point = HexCoord::new(0, 0).points()[0];
        let adjacent = point.adjacent_points();
        let unique: HashSet<_> = adjacent.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(!adjacent.contains(&point));
        for edge in point.touching_edges() {
            assert!(edge.touches(&point));
        }
    }

    #[test]
    fn test_hex_points_and_edges_are_distinct() {
        let hex = HexCoord::new(2, -1);
        let points: HashSet<_> = hex.points().into_iter().collect();
        let edges: HashSet<_> = hex.edges().into_iter().collect();
        assert_eq!(points.len(), 6);
        assert_eq!(edges.len(), 6);
        for edge in &edges {
            for endpoint in edge.endpoints() {
                assert!(points.contains(&endpoint));
            }
        }
    }

    #[test]
    fn test_edge_adjacency_through_points() {
        let edge = EdgeCoord::new(HexCoord::new(0, 0), HexCoord::new(1, 0));
        let adjacent: HashSet<_> = edge
            .endpoints()
            .iter()
            .flat_map(|p| p.touching_edges())
            .filter(|e| *e != edge)
            .collect();
        assert_eq!(adjacent.len(), 4);
    }
}
