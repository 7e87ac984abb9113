//! Multi-die roller with excluded totals and a roll log.

use crate::error::GameError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const SIDES: u32 = 6;

/// One roll: the individual dice and their sum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub dice: Vec<u8>,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct Dice {
    die_count: u32,
    excluded: BTreeSet<u32>,
    log: Vec<RollResult>,
    rng: StdRng,
}

impl Dice {
    pub fn with_seed(die_count: u32, seed: u64) -> Self {
        Self {
            die_count: die_count.max(1),
            excluded: BTreeSet::new(),
            log: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn die_count(&self) -> u32 {
        self.die_count
    }

    /// Change the number of dice. Exclusions no longer apply and are dropped.
    pub fn set_die_count(&mut self, die_count: u32) {
        self.die_count = die_count.max(1);
        self.excluded.clear();
    }

    /// Smallest and largest totals the dice can show
    pub fn range(&self) -> std::ops::RangeInclusive<u32> {
        self.die_count..=self.die_count * SIDES
    }

    /// Forbid a total. Rolls showing it are re-rolled.
    pub fn exclude(&mut self, total: u32) -> Result<(), GameError> {
        if !self.range().contains(&total) {
            return Err(GameError::NotFound(format!(
                "{total} cannot be rolled with {} dice",
                self.die_count
            )));
        }
        let remaining = self
            .range()
            .filter(|t| *t != total && !self.excluded.contains(t))
            .count();
        if remaining == 0 {
            return Err(GameError::NotFound(
                "At least one total must remain rollable".to_string(),
            ));
        }
        self.excluded.insert(total);
        Ok(())
    }

    pub fn clear_exclusions(&mut self) {
        self.excluded.clear();
    }

    pub fn roll(&mut self) -> RollResult {
        loop {
            let dice: Vec<u8> = (0..self.die_count)
                .map(|_| self.rng.gen_range(1..=SIDES) as u8)
                .collect();
            let total = dice.iter().map(|d| u32::from(*d)).sum();
            if self.excluded.contains(&total) {
                continue;
            }
            let result = RollResult { dice, total };
            self.log.push(result.clone());
            return result;
        }
    }

    pub fn roll_log(&self) -> &[RollResult] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// How often each possible total has been rolled, zeros included
    pub fn roll_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts: BTreeMap<u32, usize> = self.range().map(|t| (t, 0)).collect();
        for roll in &self.log {
            *counts.entry(roll.total).or_default() += 1;
        }
        counts
    }
}
