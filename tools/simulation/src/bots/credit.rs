//! Lender and borrower strategies for the loan clearing market
//!
//! Both respond to the clearing house poll with a priced principal volume
//! drawn from their seeded generator. They never submit continuous orders.

use crate::bots::Bot;
use crate::context::SimulationContext;
use clearing::{MarketInfo, MarketResponse, ResponseSide};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use types::ids::PartyId;

/// Offers principal each cycle at a rate around its base rate.
pub struct LenderBot {
    party_id: PartyId,
    /// Largest principal offered in one cycle
    max_principal: u64,
    /// Base rate in basis points
    base_rate_bps: u32,
    rng: ChaCha8Rng,
}

impl LenderBot {
    pub fn new(party_id: PartyId, max_principal: u64, base_rate_bps: u32, seed: u64) -> Self {
        Self {
            party_id,
            max_principal,
            base_rate_bps,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Bot for LenderBot {
    fn party_id(&self) -> PartyId {
        self.party_id
    }

    fn submit_orders(&mut self, _ctx: &mut SimulationContext) {}

    fn market_response(&mut self, _info: &MarketInfo) -> Option<MarketResponse> {
        let volume = self.rng.gen_range(1..=self.max_principal);
        let rate_bps = self.base_rate_bps + self.rng.gen_range(0..50);
        Some(MarketResponse {
            side: ResponseSide::Supply,
            price: Decimal::new(rate_bps as i64, 4),
            volume: Decimal::from(volume),
        })
    }
}

/// Demands principal each cycle, accepting rates up to its ceiling.
pub struct BorrowerBot {
    party_id: PartyId,
    max_principal: u64,
    rate_ceiling_bps: u32,
    rng: ChaCha8Rng,
}

impl BorrowerBot {
    pub fn new(party_id: PartyId, max_principal: u64, rate_ceiling_bps: u32, seed: u64) -> Self {
        Self {
            party_id,
            max_principal,
            rate_ceiling_bps,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Bot for BorrowerBot {
    fn party_id(&self) -> PartyId {
        self.party_id
    }

    fn submit_orders(&mut self, _ctx: &mut SimulationContext) {}

    fn market_response(&mut self, _info: &MarketInfo) -> Option<MarketResponse> {
        let volume = self.rng.gen_range(1..=self.max_principal);
        let rate_bps = self.rng.gen_range(0..=self.rate_ceiling_bps);
        Some(MarketResponse {
            side: ResponseSide::Demand,
            price: Decimal::new(rate_bps as i64, 4),
            volume: Decimal::from(volume),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::InstrumentId;

    fn info() -> MarketInfo {
        MarketInfo {
            instrument: InstrumentId::new("LOAN/3"),
            cycle: 0,
            reference_price: None,
        }
    }

    #[test]
    fn test_lender_offers_supply() {
        let mut bot = LenderBot::new(PartyId::new(), 50, 200, 1);
        let response = bot.market_response(&info()).unwrap();
        assert_eq!(response.side, ResponseSide::Supply);
        assert!(response.volume >= Decimal::ONE);
        assert!(response.price >= Decimal::new(200, 4));
    }

    #[test]
    fn test_borrower_demands() {
        let mut bot = BorrowerBot::new(PartyId::new(), 50, 300, 2);
        let response = bot.market_response(&info()).unwrap();
        assert_eq!(response.side, ResponseSide::Demand);
        assert!(response.price <= Decimal::new(300, 4));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let party = PartyId::new();
        let mut a = LenderBot::new(party, 50, 200, 9);
        let mut b = LenderBot::new(party, 50, 200, 9);
        for _ in 0..10 {
            assert_eq!(a.market_response(&info()), b.market_response(&info()));
        }
    }
}
