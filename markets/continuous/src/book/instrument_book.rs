//! Per-instrument bid/ask queues
//!
//! Queue ordering is a total order by (price, submission sequence): the
//! BTreeMap orders prices, the FIFO level orders equal-priced entries.
//! Bids are read descending, asks ascending.

use crate::book::price_level::{LevelEntry, PriceLevel};
use std::collections::BTreeMap;
use types::ids::{InstrumentId, OrderId};
use types::numeric::{Price, Volume};
use types::order::Side;

/// Both sides of the book for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentBook {
    instrument: InstrumentId,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
}

impl InstrumentBook {
    pub fn new(instrument: InstrumentId) -> Self {
        Self {
            instrument,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    fn side_map(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rest an order at its price level.
    pub fn insert(&mut self, side: Side, price: Price, entry: LevelEntry) {
        self.side_map_mut(side)
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .insert(entry);
    }

    /// Remove a resting order, pruning the level if it empties.
    pub fn remove(&mut self, side: Side, price: Price, order_id: &OrderId) -> Option<LevelEntry> {
        let map = self.side_map_mut(side);
        let level = map.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            map.remove(&price);
        }
        Some(entry)
    }

    /// Highest bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Front entry of the level at `price` on `side`.
    pub fn front(&self, side: Side, price: Price) -> Option<&LevelEntry> {
        self.side_map(side).get(&price)?.front()
    }

    /// Look up a resting order by side, price and id.
    pub fn get(&self, side: Side, price: Price, order_id: &OrderId) -> Option<&LevelEntry> {
        self.side_map(side).get(&price)?.get(order_id)
    }

    /// Fill the front order of the level at `price` by `volume`, pruning the
    /// level if it empties. Returns (order id, fully_filled).
    ///
    /// # Panics
    /// Panics if no level exists at that price.
    pub fn fill_front(&mut self, side: Side, price: Price, volume: Volume) -> (OrderId, bool) {
        let map = self.side_map_mut(side);
        let level = map
            .get_mut(&price)
            .expect("fill_front at a price with no level");
        let result = level.fill_front(volume);
        if level.is_empty() {
            map.remove(&price);
        }
        result
    }

    /// Total open volume on one side.
    pub fn depth(&self, side: Side) -> Volume {
        self.side_map(side)
            .values()
            .fold(Volume::zero(), |acc, level| acc + level.total_volume())
    }

    /// Number of resting orders on both sides.
    pub fn order_count(&self) -> usize {
        let bids: usize = self.bids.values().map(|l| l.order_count()).sum();
        let asks: usize = self.asks.values().map(|l| l.order_count()).sum();
        bids + asks
    }

    /// Bid levels as (price, volume), best first.
    pub fn bid_levels(&self) -> Vec<(Price, Volume)> {
        self.bids
            .iter()
            .rev()
            .map(|(price, level)| (*price, level.total_volume()))
            .collect()
    }

    /// Ask levels as (price, volume), best first.
    pub fn ask_levels(&self) -> Vec<(Price, Volume)> {
        self.asks
            .iter()
            .map(|(price, level)| (*price, level.total_volume()))
            .collect()
    }
}
