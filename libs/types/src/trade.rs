//! Trade execution types
//!
//! A trade is the atomic output of the matching engine: a buyer, a seller,
//! an instrument, a volume and a price. Settlement (an external collaborator)
//! turns trades into financial contracts and marks them settled.

use crate::ids::{InstrumentId, OrderId, PartyId, TradeId};
use crate::numeric::{Price, Volume};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeState {
    /// Trade created, pending settlement
    Matched,
    /// Fully settled to ledgers (terminal)
    Settled,
}

/// An atomic exchange between a buyer and a seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Monotonic sequence within one venue
    pub sequence: u64,
    pub instrument: InstrumentId,

    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    pub buyer: PartyId,
    pub seller: PartyId,

    pub price: Price,
    pub volume: Volume,

    /// Simulation cycle in which the match executed
    pub executed_cycle: u64,
    pub state: TradeState,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        instrument: InstrumentId,
        buyer_order_id: OrderId,
        seller_order_id: OrderId,
        buyer: PartyId,
        seller: PartyId,
        price: Price,
        volume: Volume,
        executed_cycle: u64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            instrument,
            buyer_order_id,
            seller_order_id,
            buyer,
            seller,
            price,
            volume,
            executed_cycle,
            state: TradeState::Matched,
        }
    }

    /// Trade value (price x volume)
    pub fn trade_value(&self) -> Decimal {
        self.volume.as_decimal() * self.price.as_decimal()
    }

    /// Mark the trade settled.
    pub fn settle(&mut self) {
        self.state = TradeState::Settled;
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, TradeState::Settled)
    }

    /// A party never trades with itself.
    pub fn validate_no_self_trade(&self) -> bool {
        self.buyer != self.seller
    }
}
