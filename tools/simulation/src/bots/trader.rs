//! Noise trader for the continuous stock market
//!
//! Submits one random order per cycle around a fixed reference price.
//! Rejections (insufficient cash or shares) are normal for this strategy
//! and are simply dropped.

use crate::bots::Bot;
use crate::context::SimulationContext;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use types::ids::{InstrumentId, PartyId};
use types::numeric::{Price, Volume};
use types::order::{CounterpartyFilter, Side};

pub struct NoiseTrader {
    party_id: PartyId,
    market_name: String,
    instrument: InstrumentId,
    /// Center of the price band the trader quotes around
    reference_price: u64,
    max_size: u64,
    rng: ChaCha8Rng,
}

impl NoiseTrader {
    pub fn new(
        party_id: PartyId,
        market_name: impl Into<String>,
        instrument: InstrumentId,
        reference_price: u64,
        max_size: u64,
        seed: u64,
    ) -> Self {
        Self {
            party_id,
            market_name: market_name.into(),
            instrument,
            reference_price,
            max_size,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Bot for NoiseTrader {
    fn party_id(&self) -> PartyId {
        self.party_id
    }

    fn submit_orders(&mut self, ctx: &mut SimulationContext) {
        let side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        // Sellers quote slightly below the reference, buyers slightly above,
        // so the book crosses regularly.
        let offset = self.rng.gen_range(0..=2);
        let price = match side {
            Side::Buy => self.reference_price + offset,
            Side::Sell => self.reference_price.saturating_sub(offset).max(1),
        };
        let size = self.rng.gen_range(1..=self.max_size);

        let result = ctx.submit_order(
            &self.market_name,
            self.party_id,
            &self.instrument,
            side,
            Volume::from_u64(size),
            Price::from_u64(price),
            CounterpartyFilter::Any,
        );
        if let Err(err) = result {
            debug!(party = %self.party_id, %err, "order rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use continuous_market::{Market, ReservationPolicy};
    use rust_decimal::Decimal;
    use types::party::{Party, Role};

    fn stock() -> InstrumentId {
        InstrumentId::new("STOCK/0")
    }

    #[test]
    fn test_trader_places_orders() {
        let mut ctx = SimulationContext::new();
        ctx.add_market(Market::new(
            "stock exchange",
            Role::Shareholder,
            Role::Shareholder,
            ReservationPolicy::CashForShares,
            [stock()],
        ));
        let mut party = Party::new(Decimal::from(1000), [Role::Shareholder]);
        party.portfolio.add_shares(&stock(), Volume::from_u64(100));
        let party_id = ctx.parties.insert(party);

        let mut bot = NoiseTrader::new(party_id, "stock exchange", stock(), 10, 5, 3);
        for _ in 0..5 {
            bot.submit_orders(&mut ctx);
        }

        // All orders rest or matched against each other is impossible with
        // one party, so the book holds everything submitted
        assert!(ctx.market("stock exchange").unwrap().book(&stock()).unwrap().order_count() > 0);
        assert!(ctx.reconcile_markets());
    }
}
