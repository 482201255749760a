//! Price level with FIFO queue
//!
//! A price level holds all resting orders at one price. Orders are kept in
//! strict submission order (first in, first matched), which is the
//! tie-break rule that makes matching deterministic under a fixed
//! submission order.

use std::collections::VecDeque;
use types::ids::{OrderId, PartyId};
use types::numeric::Volume;
use types::order::CounterpartyFilter;

/// A resting order's entry in a price level queue.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEntry {
    pub order_id: OrderId,
    pub party_id: PartyId,
    pub open: Volume,
    /// Venue-wide submission sequence; lower means resting earlier.
    pub seq: u64,
    pub filter: CounterpartyFilter,
}

/// All orders resting at one price, in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    entries: VecDeque<LevelEntry>,
    total_volume: Volume,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            total_volume: Volume::zero(),
        }
    }

    /// Append an order at the back of the queue (time priority).
    pub fn insert(&mut self, entry: LevelEntry) {
        self.total_volume = self.total_volume + entry.open;
        self.entries.push_back(entry);
    }

    /// Remove an order by id, returning its entry if present.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<LevelEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.order_id == order_id)?;
        let entry = self.entries.remove(position)?;
        self.total_volume = self
            .total_volume
            .checked_sub(entry.open)
            .expect("Level total fell below entry volume");
        Some(entry)
    }

    /// The order at the front of the queue.
    pub fn front(&self) -> Option<&LevelEntry> {
        self.entries.front()
    }

    /// Look up a resting order by id.
    pub fn get(&self, order_id: &OrderId) -> Option<&LevelEntry> {
        self.entries.iter().find(|entry| &entry.order_id == order_id)
    }

    /// Reduce the front order's open volume after a fill. The entry is
    /// removed once fully filled. Returns (order id, fully_filled).
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the front's open volume.
    pub fn fill_front(&mut self, volume: Volume) -> (OrderId, bool) {
        let entry = self
            .entries
            .front_mut()
            .expect("fill_front on empty price level");

        entry.open = entry
            .open
            .checked_sub(volume)
            .expect("Fill exceeds front order's open volume");
        self.total_volume = self
            .total_volume
            .checked_sub(volume)
            .expect("Level total fell below fill volume");

        let order_id = entry.order_id;
        if entry.open.is_zero() {
            self.entries.pop_front();
            (order_id, true)
        } else {
            (order_id, false)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_volume(&self) -> Volume {
        self.total_volume
    }

    pub fn order_count(&self) -> usize {
        self.entries.len()
    }
}
