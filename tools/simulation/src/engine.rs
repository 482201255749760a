//! Simulation engine
//!
//! Drives bots, markets, the clearing house and settlement through the
//! scheduler's three-phase cycle. Within the submit phase bots act in the
//! order they were added; matching is eager inside each submission, trades
//! queue until the settle phase.

use crate::bots::Bot;
use crate::context::SimulationContext;
use crate::scheduler::{Phase, Scheduler};
use clearing::{ClearingHouse, ClearingSummary, RandomDenyRationing, ResponseSide};
use continuous_market::ReservationPolicy;
use rust_decimal::Decimal;
use tracing::{info, warn};
use types::ids::InstrumentId;
use types::party::Parties;

enum Event {
    AgentTurn(usize),
    MatchAndClear,
    Settle,
}

/// One self-contained simulation run.
pub struct SimEngine {
    pub ctx: SimulationContext,
    bots: Vec<Box<dyn Bot>>,
    loan_clearing: Option<(InstrumentId, ClearingHouse<RandomDenyRationing>)>,
    scheduler: Scheduler<Event>,
    pending_clearing: Vec<ClearingSummary>,
}

impl SimEngine {
    pub fn new(ctx: SimulationContext) -> Self {
        Self {
            ctx,
            bots: Vec::new(),
            loan_clearing: None,
            scheduler: Scheduler::new(),
            pending_clearing: Vec::new(),
        }
    }

    /// Bots act in the order they are added; this order is part of the
    /// determinism contract.
    pub fn add_bot(&mut self, bot: Box<dyn Bot>) {
        self.bots.push(bot);
    }

    pub fn set_loan_clearing(
        &mut self,
        instrument: InstrumentId,
        house: ClearingHouse<RandomDenyRationing>,
    ) {
        self.loan_clearing = Some((instrument, house));
    }

    /// Run `cycles` full cycles and drain the queue.
    pub fn run(&mut self, cycles: u64) {
        for cycle in 0..cycles {
            for i in 0..self.bots.len() {
                self.scheduler
                    .schedule(cycle, Phase::SubmitOrders, Event::AgentTurn(i));
            }
            self.scheduler
                .schedule(cycle, Phase::MatchAndClear, Event::MatchAndClear);
            self.scheduler.schedule(cycle, Phase::Settle, Event::Settle);
        }

        while let Some((key, event)) = self.scheduler.pop() {
            self.ctx.advance_cycle(key.cycle);
            match event {
                Event::AgentTurn(i) => self.bots[i].submit_orders(&mut self.ctx),
                Event::MatchAndClear => self.clear_markets(),
                Event::Settle => self.settle_phase(),
            }
        }
        info!(cycles, "simulation run complete");
    }

    /// Match-and-clear phase: run the clearing cycle, stashing the summary
    /// for the settle phase. Continuous matching already happened inside
    /// each submission.
    fn clear_markets(&mut self) {
        let Some((instrument, house)) = self.loan_clearing.as_mut() else {
            return;
        };
        let instrument = instrument.clone();
        let cycle = self.ctx.cycle;
        let bots = &mut self.bots;

        let summary = house.clear(
            &instrument,
            cycle,
            |party_id, info| {
                bots.iter_mut()
                    .find(|bot| &bot.party_id() == party_id)
                    .and_then(|bot| bot.market_response(info))
            },
            |_, _| {},
        );
        match summary {
            Ok(summary) => {
                if !summary.cleared_volume.is_zero() {
                    self.pending_clearing.push(summary);
                }
            }
            Err(err) => warn!(%err, "clearing cycle rejected"),
        }
    }

    /// Settle phase: apply continuous trades, turn cleared volume into loan
    /// contracts, then collect repayments falling due this cycle.
    fn settle_phase(&mut self) {
        let cycle = self.ctx.cycle;

        for (policy, mut trade) in self.ctx.take_pending_trades() {
            let result = match policy {
                ReservationPolicy::CashForShares => self
                    .ctx
                    .settlement
                    .settle_share_trade(&mut self.ctx.parties, &mut trade),
                ReservationPolicy::PrincipalFromSeller => {
                    let term = trade.instrument.maturity().unwrap_or(1);
                    self.ctx
                        .settlement
                        .originate_loan(
                            &mut self.ctx.parties,
                            &trade.instrument,
                            trade.seller,
                            trade.buyer,
                            trade.volume.as_decimal(),
                            trade.price.as_decimal(),
                            cycle,
                            term,
                        )
                        .map(|_| ())
                }
            };
            if let Err(err) = result {
                warn!(trade = %trade.trade_id, %err, "trade failed to settle");
            }
        }

        for summary in std::mem::take(&mut self.pending_clearing) {
            let (instrument, _) = self.loan_clearing.as_ref().expect("summary implies a house");
            let instrument = instrument.clone();
            settle_cleared_loans(
                &mut self.ctx.settlement,
                &mut self.ctx.parties,
                &instrument,
                &summary,
                cycle,
            );
        }

        for contract_id in self.ctx.settlement.due_at(cycle) {
            if let Err(err) = self.ctx.settlement.repay(&mut self.ctx.parties, &contract_id) {
                warn!(contract = %contract_id, %err, "repayment missed");
            }
        }
    }
}

/// Pair cleared supply against cleared demand in allocation order and
/// originate a loan per pairing. A lender who cannot actually fund its
/// allocation is skipped; conservation of the rationing output does not
/// guarantee uncommitted cash, since clearing reserves nothing.
fn settle_cleared_loans(
    settlement: &mut crate::settlement::SettlementAgent,
    parties: &mut Parties,
    instrument: &InstrumentId,
    summary: &ClearingSummary,
    cycle: u64,
) {
    let Some(rate) = summary.clearing_price else {
        return;
    };
    let term = instrument.maturity().unwrap_or(1);

    let mut supply: Vec<_> = summary
        .allocations
        .iter()
        .filter(|a| a.side == ResponseSide::Supply && !a.allocated.is_zero())
        .map(|a| (a.party_id, a.allocated))
        .collect();
    let mut demand: Vec<_> = summary
        .allocations
        .iter()
        .filter(|a| a.side == ResponseSide::Demand && !a.allocated.is_zero())
        .map(|a| (a.party_id, a.allocated))
        .collect();

    let (mut i, mut j) = (0, 0);
    while i < supply.len() && j < demand.len() {
        let volume = supply[i].1.min(demand[j].1);
        let result = settlement.originate_loan(
            parties,
            instrument,
            supply[i].0,
            demand[j].0,
            volume,
            rate,
            cycle,
            term,
        );
        match result {
            Ok(_) => {
                supply[i].1 -= volume;
                demand[j].1 -= volume;
            }
            Err(err) => {
                warn!(%err, "cleared loan not funded");
                supply[i].1 = Decimal::ZERO;
            }
        }
        if supply[i].1.is_zero() {
            i += 1;
        }
        if j < demand.len() && demand[j].1.is_zero() {
            j += 1;
        }
    }
}
