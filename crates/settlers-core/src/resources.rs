//! Resource kinds, resource hands and the building cost table.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five resource kinds produced by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Brick,
    Wheat,
    Sheep,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Wheat,
        Resource::Sheep,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Wheat => "wheat",
            Resource::Sheep => "sheep",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A multiset of resource cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub wheat: u32,
    pub sheep: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts, in `Resource::ALL` order
    pub fn with_amounts(wood: u32, brick: u32, wheat: u32, sheep: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            wheat,
            sheep,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.wheat + self.sheep + self.ore
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Wheat => self.wheat,
            Resource::Sheep => self.sheep,
            Resource::Ore => self.ore,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Wheat => &mut self.wheat,
            Resource::Sheep => &mut self.sheep,
            Resource::Ore => &mut self.ore,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Whether every count in `other` is covered by this hand
    pub fn contains(&self, other: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&resource| self.get(resource) >= other.get(resource))
    }

    /// Remove `other` from this hand. Leaves the hand untouched and returns
    /// false when any count is insufficient.
    pub fn remove(&mut self, other: &ResourceHand) -> bool {
        if !self.contains(other) {
            return false;
        }
        for resource in Resource::ALL {
            *self.slot(resource) -= other.get(resource);
        }
        true
    }

    /// Remove every card of one kind, returning how many were taken
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        std::mem::take(self.slot(resource))
    }

    /// Remove one card chosen uniformly over all cards in the hand
    pub fn remove_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..total);
        for resource in Resource::ALL {
            let count = self.get(resource);
            if pick < count {
                *self.slot(resource) -= 1;
                return Some(resource);
            }
            pick -= count;
        }
        None
    }

    /// Kinds present in the hand with their counts
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|resource| (resource, self.get(resource)))
            .filter(|(_, count)| *count > 0)
    }
}

impl fmt::Display for ResourceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("nothing");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(resource, count)| format!("{count} {resource}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Things a player can buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchasableItem {
    Road,
    Settlement,
    City,
    DevelopmentCard,
}

impl PurchasableItem {
    pub fn cost(&self) -> ResourceHand {
        match self {
            // 1 wood, 1 brick
            PurchasableItem::Road => ResourceHand::with_amounts(1, 1, 0, 0, 0),
            // 1 wood, 1 brick, 1 wheat, 1 sheep
            PurchasableItem::Settlement => ResourceHand::with_amounts(1, 1, 1, 1, 0),
            // 2 wheat, 3 ore
            PurchasableItem::City => ResourceHand::with_amounts(0, 0, 2, 0, 3),
            // 1 wheat, 1 sheep, 1 ore
            PurchasableItem::DevelopmentCard => ResourceHand::with_amounts(0, 0, 1, 1, 1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PurchasableItem::Road => "road",
            PurchasableItem::Settlement => "settlement",
            PurchasableItem::City => "city",
            PurchasableItem::DevelopmentCard => "development card",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_resource_hand_total() {
        let hand = ResourceHand::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
    }

    #[test]
    fn test_contains() {
        let hand = ResourceHand::with_amounts(2, 2, 2, 2, 2);
        assert!(hand.contains(&ResourceHand::with_amounts(1, 1, 1, 1, 1)));
        assert!(!hand.contains(&ResourceHand::single(Resource::Wood, 3)));
    }

    #[test]
    fn test_remove_is_all_or_nothing() {
        let mut hand = ResourceHand::with_amounts(1, 0, 4, 0, 0);
        assert!(!hand.remove(&ResourceHand::with_amounts(1, 1, 0, 0, 0)));
        assert_eq!(hand, ResourceHand::with_amounts(1, 0, 4, 0, 0));
        assert!(hand.remove(&ResourceHand::with_amounts(1, 0, 2, 0, 0)));
        assert_eq!(hand, ResourceHand::single(Resource::Wheat, 2));
    }

    #[test]
    fn test_take_all() {
        let mut hand = ResourceHand::with_amounts(0, 0, 5, 1, 0);
        assert_eq!(hand.take_all(Resource::Wheat), 5);
        assert_eq!(hand.get(Resource::Wheat), 0);
        assert_eq!(hand.total(), 1);
    }

    #[test]
    fn test_remove_random_single_card() {
        let mut hand = ResourceHand::single(Resource::Sheep, 1);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(hand.remove_random(&mut rng), Some(Resource::Sheep));
        assert!(hand.is_empty());
        assert_eq!(hand.remove_random(&mut rng), None);
    }

    #[test]
    fn test_building_costs() {
        assert_eq!(PurchasableItem::Road.cost().total(), 2);
        assert_eq!(
            PurchasableItem::Settlement.cost(),
            ResourceHand::with_amounts(1, 1, 1, 1, 0)
        );
        assert_eq!(
            PurchasableItem::City.cost(),
            ResourceHand {
                wheat: 2,
                ore: 3,
                ..ResourceHand::default()
            }
        );
        assert_eq!(PurchasableItem::DevelopmentCard.cost().total(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceHand::new().to_string(), "nothing");
        assert_eq!(
            ResourceHand::with_amounts(2, 0, 0, 0, 1).to_string(),
            "2 wood, 1 ore"
        );
    }

    proptest! {
        #[test]
        fn remove_random_takes_exactly_one_card(
            counts in proptest::array::uniform5(0u32..6),
            seed in any::<u64>(),
        ) {
            let [wood, brick, wheat, sheep, ore] = counts;
            let mut hand = ResourceHand::with_amounts(wood, brick, wheat, sheep, ore);
            let before = hand;
            let mut rng = StdRng::seed_from_u64(seed);
            match hand.remove_random(&mut rng) {
                Some(resource) => {
                    prop_assert_eq!(hand.total() + 1, before.total());
                    prop_assert_eq!(hand.get(resource) + 1, before.get(resource));
                }
                None => prop_assert!(before.is_empty()),
            }
        }
    }
}
