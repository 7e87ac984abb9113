//! Player-to-player trade offers.

use crate::board::PlayerId;
use crate::resources::{Resource, ResourceHand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A proposal to swap two resource hands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub creator: PlayerId,
    /// What the creator hands over
    pub give: ResourceHand,
    /// What the creator wants back
    pub receive: ResourceHand,
}

impl TradeOffer {
    pub fn new(creator: PlayerId, give: ResourceHand, receive: ResourceHand) -> Self {
        Self {
            creator,
            give,
            receive,
        }
    }

    /// Both sides non-empty and not the same hand
    pub fn is_valid(&self) -> bool {
        !self.give.is_empty() && !self.receive.is_empty() && self.give != self.receive
    }

    /// Whether a bank trade at these rates is exact: no kind on both sides,
    /// every given kind a positive multiple of its rate and the received
    /// total matching the bundles given.
    pub fn is_valid_bank_trade(&self, rate_for: impl Fn(Resource) -> u32) -> bool {
        if !self.is_valid() {
            return false;
        }

        let mut bundles = 0;
        for (resource, count) in self.give.iter() {
            if self.receive.get(resource) > 0 {
                return false;
            }
            let rate = rate_for(resource);
            if rate == 0 || count % rate != 0 {
                return false;
            }
            bundles += count / rate;
        }
        bundles == self.receive.total()
    }
}

/// The active player's offer and the counter-offers it attracted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeNegotiator {
    active_offer: Option<TradeOffer>,
    counter_offers: BTreeMap<PlayerId, TradeOffer>,
}

impl TradeNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a fresh offer from the active player
    pub fn open(&mut self, offer: TradeOffer) {
        self.counter_offers.clear();
        self.active_offer = Some(offer);
    }

    pub fn active_offer(&self) -> Option<&TradeOffer> {
        self.active_offer.as_ref()
    }

    /// Post or replace `offer.creator`'s counter-offer
    pub fn counter(&mut self, offer: TradeOffer) {
        self.counter_offers.insert(offer.creator, offer);
    }

    pub fn counter_offer(&self, player: PlayerId) -> Option<&TradeOffer> {
        self.counter_offers.get(&player)
    }

    pub fn counter_offers(&self) -> impl Iterator<Item = &TradeOffer> {
        self.counter_offers.values()
    }

    /// Drop one player's counter-offer. Returns whether there was one.
    pub fn cancel_counter(&mut self, player: PlayerId) -> bool {
        self.counter_offers.remove(&player).is_some()
    }

    pub fn clear(&mut self) {
        self.active_offer = None;
        self.counter_offers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.active_offer.is_none() && self.counter_offers.is_empty()
    }
}
