//! Order lifecycle types
//!
//! An order is a party's resting request to buy or sell a volume of an
//! instrument at a limit price. Open volume shrinks on partial fills and the
//! order leaves its queue when open volume reaches zero or it is cancelled.

use crate::ids::{InstrumentId, OrderId, PartyId};
use crate::numeric::{Price, Volume};
use crate::party::Role;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// Optional per-order eligibility filter restricting who may take the other
/// side of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterpartyFilter {
    /// Any eligible counterparty (default)
    #[default]
    Any,
    /// Only counterparties holding this role
    OnlyRole(Role),
    /// Never trade with this specific party
    ExcludeParty(PartyId),
}

impl CounterpartyFilter {
    /// Whether a counterparty passes this filter.
    pub fn admits(&self, party: PartyId, roles: &[Role]) -> bool {
        match self {
            CounterpartyFilter::Any => true,
            CounterpartyFilter::OnlyRole(role) => roles.contains(role),
            CounterpartyFilter::ExcludeParty(excluded) => party != *excluded,
        }
    }
}

/// A resting or matched request to trade an instrument at a limit price.
///
/// Invariant: `0 <= open <= size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub party_id: PartyId,
    pub instrument: InstrumentId,
    pub side: Side,
    /// Original size
    pub size: Volume,
    /// Remaining (open) size
    pub open: Volume,
    pub price: Price,
    pub filter: CounterpartyFilter,
}

impl Order {
    pub fn new(
        party_id: PartyId,
        instrument: InstrumentId,
        side: Side,
        size: Volume,
        price: Price,
        filter: CounterpartyFilter,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            party_id,
            instrument,
            side,
            size,
            open: size,
            price,
            filter,
        }
    }

    /// Check the open-size invariant: 0 <= open <= size
    pub fn check_invariant(&self) -> bool {
        self.open <= self.size
    }

    pub fn is_filled(&self) -> bool {
        self.open.is_zero()
    }

    /// Reduce open size after a fill.
    ///
    /// # Panics
    /// Panics if the fill exceeds the open size.
    pub fn fill(&mut self, volume: Volume) {
        self.open = self
            .open
            .checked_sub(volume)
            .expect("Fill would exceed open order size");
        assert!(self.check_invariant(), "Invariant violated after fill");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order(side: Side, size: u64, price: u64) -> Order {
        Order::new(
            PartyId::new(),
            InstrumentId::new("LOAN/3"),
            side,
            Volume::from_u64(size),
            Price::from_u64(price),
            CounterpartyFilter::Any,
        )
    }

    #[test]
    fn test_order_creation() {
        let order = sample_order(Side::Buy, 10, 5);
        assert_eq!(order.open, order.size);
        assert!(order.check_invariant());
        assert!(!order.is_filled());
    }

    #[test]
    fn test_order_fill() {
        let mut order = sample_order(Side::Sell, 10, 5);

        order.fill(Volume::from_u64(4));
        assert_eq!(order.open, Volume::from_u64(6));
        assert!(!order.is_filled());

        order.fill(Volume::from_u64(6));
        assert!(order.is_filled());
        assert!(order.check_invariant());
    }

    #[test]
    #[should_panic(expected = "Fill would exceed open order size")]
    fn test_order_overfill_panics() {
        let mut order = sample_order(Side::Buy, 5, 5);
        order.fill(Volume::from_u64(6));
    }

    #[test]
    fn test_filter_any_admits_everyone() {
        let filter = CounterpartyFilter::Any;
        assert!(filter.admits(PartyId::new(), &[]));
    }

    #[test]
    fn test_filter_only_role() {
        let filter = CounterpartyFilter::OnlyRole(Role::Lender);
        assert!(filter.admits(PartyId::new(), &[Role::Lender, Role::Shareholder]));
        assert!(!filter.admits(PartyId::new(), &[Role::Borrower]));
    }

    #[test]
    fn test_filter_exclude_party() {
        let blocked = PartyId::new();
        let filter = CounterpartyFilter::ExcludeParty(blocked);
        assert!(!filter.admits(blocked, &[]));
        assert!(filter.admits(PartyId::new(), &[]));
    }

    #[test]
    fn test_order_serialization() {
        let order = sample_order(Side::Sell, 3, 7);
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
