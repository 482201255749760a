//! Trade executor
//!
//! Mints trades with a venue-wide monotonic sequence so trade logs replay
//! in execution order.

use types::ids::{InstrumentId, OrderId, PartyId};
use types::numeric::{Price, Volume};
use types::trade::Trade;

/// Creates sequenced trades for one venue.
#[derive(Debug, Clone)]
pub struct TradeExecutor {
    next_sequence: u64,
}

impl TradeExecutor {
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            next_sequence: starting_sequence,
        }
    }

    /// Create the next trade in sequence.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        instrument: InstrumentId,
        buyer_order_id: OrderId,
        seller_order_id: OrderId,
        buyer: PartyId,
        seller: PartyId,
        price: Price,
        volume: Volume,
        cycle: u64,
    ) -> Trade {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Trade::new(
            sequence,
            instrument,
            buyer_order_id,
            seller_order_id,
            buyer,
            seller,
            price,
            volume,
            cycle,
        )
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
