//! Demo agent strategies
//!
//! Every bot owns its own seeded generator, so a simulation's outcome is a
//! pure function of its seeds and construction order.

pub mod credit;
pub mod trader;

pub use credit::{BorrowerBot, LenderBot};
pub use trader::NoiseTrader;

use crate::context::SimulationContext;
use clearing::{MarketInfo, MarketResponse};
use types::ids::PartyId;

/// An agent strategy driven by the simulation engine.
pub trait Bot {
    fn party_id(&self) -> PartyId;

    /// Called once per cycle in the submit-orders phase.
    fn submit_orders(&mut self, ctx: &mut SimulationContext);

    /// Polled by a clearing house in the match-and-clear phase. None means
    /// the bot sits this cycle out.
    fn market_response(&mut self, _info: &MarketInfo) -> Option<MarketResponse> {
        None
    }
}
