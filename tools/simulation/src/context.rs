//! Simulation context
//!
//! All shared state for one simulation lives here and is passed explicitly
//! to whoever needs it. There are no process-wide registries, so any number
//! of simulations can run side by side in one process or test binary.

use continuous_market::{Market, MatchOutcome, ReservationPolicy};
use crate::settlement::SettlementAgent;
use std::collections::BTreeMap;
use tracing::debug;
use types::errors::MarketError;
use types::ids::{InstrumentId, PartyId};
use types::numeric::{Price, Volume};
use types::order::{CounterpartyFilter, Side};
use types::party::Parties;
use types::trade::Trade;

/// Shared state of one running simulation.
pub struct SimulationContext {
    pub cycle: u64,
    pub parties: Parties,
    markets: BTreeMap<String, Market>,
    pub settlement: SettlementAgent,
    /// Trades matched this cycle, waiting for the settle phase. Tagged with
    /// the reservation policy of the venue that produced them, which decides
    /// how they settle.
    pending_trades: Vec<(ReservationPolicy, Trade)>,
}

impl SimulationContext {
    pub fn new() -> Self {
        Self {
            cycle: 0,
            parties: Parties::new(),
            markets: BTreeMap::new(),
            settlement: SettlementAgent::new(),
            pending_trades: Vec::new(),
        }
    }

    pub fn add_market(&mut self, market: Market) {
        self.markets.insert(market.name().to_string(), market);
    }

    pub fn market(&self, name: &str) -> Option<&Market> {
        self.markets.get(name)
    }

    pub fn market_mut(&mut self, name: &str) -> Option<&mut Market> {
        self.markets.get_mut(name)
    }

    pub fn market_names(&self) -> impl Iterator<Item = &str> {
        self.markets.keys().map(String::as_str)
    }

    /// Submit an order to a named market. Trades produced by the match are
    /// queued for the settle phase.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_order(
        &mut self,
        market_name: &str,
        party_id: PartyId,
        instrument: &InstrumentId,
        side: Side,
        size: Volume,
        price: Price,
        filter: CounterpartyFilter,
    ) -> Result<MatchOutcome, MarketError> {
        let market = self
            .markets
            .get_mut(market_name)
            .unwrap_or_else(|| panic!("no market named {market_name}"));
        let cycle = self.cycle;
        let outcome = market.add_order(
            &mut self.parties,
            party_id,
            instrument,
            side,
            size,
            price,
            filter,
            cycle,
        )?;
        let policy = market.policy();
        self.pending_trades
            .extend(outcome.trades.iter().cloned().map(|t| (policy, t)));
        Ok(outcome)
    }

    pub fn pending_trade_count(&self) -> usize {
        self.pending_trades.len()
    }

    pub fn take_pending_trades(&mut self) -> Vec<(ReservationPolicy, Trade)> {
        std::mem::take(&mut self.pending_trades)
    }

    /// Every venue's recorded reservations match its open orders.
    pub fn reconcile_markets(&self) -> bool {
        // Exact per-venue reconciliation requires each party to trade on one
        // venue; the demo engine assigns parties that way.
        self.markets.values().all(|m| m.reconcile(&self.parties))
    }

    /// Total cash held across all parties. Settlement only transfers, so
    /// this is invariant over a whole simulation.
    pub fn total_cash(&self) -> rust_decimal::Decimal {
        self.parties
            .iter()
            .map(|(_, party)| party.portfolio.cash().held())
            .sum()
    }

    /// Total held shares of an instrument across all parties.
    pub fn total_shares(&self, instrument: &InstrumentId) -> Volume {
        self.parties
            .iter()
            .filter_map(|(_, party)| party.portfolio.shares(instrument))
            .fold(Volume::zero(), |acc, ledger| acc + ledger.held())
    }

    pub fn advance_cycle(&mut self, cycle: u64) {
        if cycle != self.cycle {
            debug!(cycle, "advancing simulation cycle");
            self.cycle = cycle;
        }
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new()
    }
}
