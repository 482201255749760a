//! Market venue
//!
//! Binds a set of instruments to a role-eligibility policy and a resource
//! reservation rule. Order flow is reserve-then-match: the required cash or
//! shares are reserved in the submitting party's ledger before the order
//! can reach the book, so no resource ever backs two open orders.

use crate::book::{InstrumentBook, LevelEntry};
use crate::matching::{self, TradeExecutor};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use types::errors::{AllocationError, MarketError, OrderError};
use types::ids::{InstrumentId, OrderId, PartyId};
use types::ledger::{cash_required, Portfolio};
use types::numeric::{Price, Volume};
use types::order::{CounterpartyFilter, Order, Side};
use types::party::{Parties, Role};
use types::trade::Trade;

/// What a submission must reserve before entering the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationPolicy {
    /// Equity-style: buyers reserve `size x price` cash, sellers reserve
    /// `size` shares of the instrument.
    CashForShares,
    /// Credit-style: sellers (lenders) reserve the principal `size` in
    /// cash; buyers (borrowers) reserve nothing up front. The price is an
    /// interest rate, not a payment per unit.
    PrincipalFromSeller,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub order_id: OrderId,
    /// Trades produced by the uncross pass, in execution order.
    pub trades: Vec<Trade>,
    /// Open (unmatched) size still resting in the book.
    pub open: Volume,
}

/// A trading venue: instruments, role policy, reservation policy.
///
/// `index` holds the authoritative `Order` for everything resting in a
/// book; the per-level entries mirror its open volume.
pub struct Market {
    name: String,
    buyer_role: Role,
    seller_role: Role,
    policy: ReservationPolicy,
    books: BTreeMap<InstrumentId, InstrumentBook>,
    index: HashMap<OrderId, Order>,
    executor: TradeExecutor,
    next_seq: u64,
}

impl Market {
    pub fn new(
        name: impl Into<String>,
        buyer_role: Role,
        seller_role: Role,
        policy: ReservationPolicy,
        instruments: impl IntoIterator<Item = InstrumentId>,
    ) -> Self {
        let books = instruments
            .into_iter()
            .map(|instrument| (instrument.clone(), InstrumentBook::new(instrument)))
            .collect();
        Self {
            name: name.into(),
            buyer_role,
            seller_role,
            policy,
            books,
            index: HashMap::new(),
            executor: TradeExecutor::new(1),
            next_seq: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> ReservationPolicy {
        self.policy
    }

    pub fn book(&self, instrument: &InstrumentId) -> Option<&InstrumentBook> {
        self.books.get(instrument)
    }

    /// A resting order by id. `None` once it is fully matched or cancelled.
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.index.get(order_id)
    }

    /// Submit an order.
    ///
    /// Validates size/price and role eligibility, reserves the required
    /// resource, inserts the order and uncrosses the book. Rejection leaves
    /// no partial state anywhere.
    #[allow(clippy::too_many_arguments)]
    pub fn add_order(
        &mut self,
        parties: &mut Parties,
        party_id: PartyId,
        instrument: &InstrumentId,
        side: Side,
        size: Volume,
        price: Price,
        filter: CounterpartyFilter,
        cycle: u64,
    ) -> Result<MatchOutcome, MarketError> {
        if size.is_zero() {
            return Err(OrderError::NonPositiveSize {
                size: size.to_string(),
            }
            .into());
        }
        if price.is_zero() {
            return Err(OrderError::NonPositivePrice {
                price: price.to_string(),
            }
            .into());
        }
        if !self.books.contains_key(instrument) {
            return Err(OrderError::UnknownInstrument {
                instrument: instrument.to_string(),
            }
            .into());
        }

        let party = parties.get(&party_id).ok_or_else(|| OrderError::UnknownParty {
            party: party_id.to_string(),
        })?;
        let required_role = match side {
            Side::Buy => self.buyer_role,
            Side::Sell => self.seller_role,
        };
        if !party.has_role(required_role) {
            return Err(OrderError::RoleNotPermitted {
                party: party_id.to_string(),
                side: format!("{:?}", side).to_lowercase(),
                required: format!("{:?}", required_role),
            }
            .into());
        }

        // Reserve before the order can touch the book.
        self.reserve(parties, party_id, instrument, side, size, price)?;

        let seq = self.next_seq;
        self.next_seq += 1;

        let order = Order::new(party_id, instrument.clone(), side, size, price, filter);
        let order_id = order.order_id;
        let book = self.books.get_mut(instrument).expect("instrument checked above");
        book.insert(
            side,
            price,
            LevelEntry {
                order_id,
                party_id,
                open: size,
                seq,
                filter: order.filter.clone(),
            },
        );
        self.index.insert(order_id, order);
        debug!(market = %self.name, instrument = %instrument, ?side, %size, %price, "order accepted");

        let fills = matching::uncross(book, parties, &mut self.executor, cycle);

        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            self.release_for_fill(parties, &fill);
            self.apply_fill(&fill.trade.buyer_order_id, fill.trade.volume, fill.buyer_filled);
            self.apply_fill(&fill.trade.seller_order_id, fill.trade.volume, fill.seller_filled);
            trades.push(fill.trade);
        }

        let open = self
            .index
            .get(&order_id)
            .map(|order| order.open)
            .unwrap_or_else(Volume::zero);
        Ok(MatchOutcome {
            order_id,
            trades,
            open,
        })
    }

    /// Mirror one fill onto the indexed order, dropping it once filled.
    fn apply_fill(&mut self, order_id: &OrderId, volume: Volume, left_book: bool) {
        let order = self
            .index
            .get_mut(order_id)
            .expect("matched order must be indexed");
        order.fill(volume);
        assert_eq!(
            order.is_filled(),
            left_book,
            "book and index disagree on fill state"
        );
        if order.is_filled() {
            self.index.remove(order_id);
        }
    }

    /// Cancel a resting order. Returns false if the order is unknown,
    /// already matched, or already cancelled; in that case nothing is
    /// mutated. Otherwise the remaining reservation is released.
    pub fn cancel(&mut self, parties: &mut Parties, order_id: &OrderId) -> bool {
        let Some(order) = self.index.remove(order_id) else {
            return false;
        };
        let book = self
            .books
            .get_mut(&order.instrument)
            .expect("indexed order must have a book");
        let entry = book
            .remove(order.side, order.price, order_id)
            .expect("indexed order must be resting in its book");
        assert_eq!(
            entry.open, order.open,
            "book and index disagree on open volume"
        );

        self.release_remaining(parties, &order);
        debug!(market = %self.name, order = %order_id, "order cancelled");
        true
    }

    /// Diagnostic: recompute what every party should have reserved for this
    /// venue's open orders and compare against the ledgers. Exact when this
    /// venue is the only source of reservations; the simulation context sums
    /// expectations across venues otherwise.
    pub fn reconcile(&self, parties: &Parties) -> bool {
        let mut expected: BTreeMap<PartyId, (Decimal, BTreeMap<InstrumentId, Volume>)> =
            BTreeMap::new();

        for (order_id, order) in &self.index {
            let book = self.books.get(&order.instrument).expect("indexed book");
            let Some(entry) = book.get(order.side, order.price, order_id) else {
                return false;
            };
            if entry.open != order.open {
                return false;
            }
            let slot = expected
                .entry(order.party_id)
                .or_insert_with(|| (Decimal::ZERO, BTreeMap::new()));

            match (self.policy, order.side) {
                (ReservationPolicy::CashForShares, Side::Buy) => {
                    slot.0 += cash_required(order.open, order.price);
                }
                (ReservationPolicy::CashForShares, Side::Sell) => {
                    let shares = slot
                        .1
                        .entry(order.instrument.clone())
                        .or_insert_with(Volume::zero);
                    *shares = *shares + order.open;
                }
                (ReservationPolicy::PrincipalFromSeller, Side::Sell) => {
                    slot.0 += order.open.as_decimal();
                }
                (ReservationPolicy::PrincipalFromSeller, Side::Buy) => {}
            }
        }

        for (party_id, party) in parties.iter() {
            let (cash, shares) = expected
                .remove(party_id)
                .unwrap_or_else(|| (Decimal::ZERO, BTreeMap::new()));
            if !party.portfolio.reconcile(cash, &shares) {
                return false;
            }
        }
        expected.is_empty()
    }

    fn reserve(
        &self,
        parties: &mut Parties,
        party_id: PartyId,
        instrument: &InstrumentId,
        side: Side,
        size: Volume,
        price: Price,
    ) -> Result<(), AllocationError> {
        let portfolio = &mut parties
            .get_mut(&party_id)
            .expect("party checked before reservation")
            .portfolio;

        match (self.policy, side) {
            (ReservationPolicy::CashForShares, Side::Buy) => {
                reserve_cash(portfolio, cash_required(size, price))
            }
            (ReservationPolicy::CashForShares, Side::Sell) => {
                portfolio.allocate_shares(instrument, size)
            }
            (ReservationPolicy::PrincipalFromSeller, Side::Sell) => {
                reserve_cash(portfolio, size.as_decimal())
            }
            (ReservationPolicy::PrincipalFromSeller, Side::Buy) => Ok(()),
        }
    }

    /// Release the matched portion of both parties' reservations.
    fn release_for_fill(&self, parties: &mut Parties, fill: &matching::Fill) {
        let trade = &fill.trade;
        match self.policy {
            ReservationPolicy::CashForShares => {
                let buyer = parties.get_mut(&trade.buyer).expect("buyer must exist");
                buyer
                    .portfolio
                    .disallocate_cash(cash_required(trade.volume, fill.buyer_limit));

                let seller = parties.get_mut(&trade.seller).expect("seller must exist");
                seller
                    .portfolio
                    .disallocate_shares(&trade.instrument, trade.volume)
                    .expect("seller's matched shares must have been reserved");
            }
            ReservationPolicy::PrincipalFromSeller => {
                let seller = parties.get_mut(&trade.seller).expect("seller must exist");
                seller.portfolio.disallocate_cash(trade.volume.as_decimal());
            }
        }
    }

    /// Release the reservation behind a cancelled order's remaining volume.
    fn release_remaining(&self, parties: &mut Parties, order: &Order) {
        let portfolio = &mut parties
            .get_mut(&order.party_id)
            .expect("cancelled order's party must exist")
            .portfolio;

        match (self.policy, order.side) {
            (ReservationPolicy::CashForShares, Side::Buy) => {
                portfolio.disallocate_cash(cash_required(order.open, order.price));
            }
            (ReservationPolicy::CashForShares, Side::Sell) => {
                portfolio
                    .disallocate_shares(&order.instrument, order.open)
                    .expect("cancelled order's shares must have been reserved");
            }
            (ReservationPolicy::PrincipalFromSeller, Side::Sell) => {
                portfolio.disallocate_cash(order.open.as_decimal());
            }
            (ReservationPolicy::PrincipalFromSeller, Side::Buy) => {}
        }
    }
}

/// Cash reservations cap silently in the ledger; the venue turns a short
/// grant into a rejection so an under-backed order never reaches the book.
fn reserve_cash(portfolio: &mut Portfolio, required: Decimal) -> Result<(), AllocationError> {
    let granted = portfolio.allocate_cash(required);
    if granted < required {
        portfolio.disallocate_cash(granted);
        return Err(AllocationError::InsufficientCash {
            required: required.to_string(),
            reserved: granted.to_string(),
        });
    }
    Ok(())
}
