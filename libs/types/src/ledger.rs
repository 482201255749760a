//! Allocation ledger: per-party bookkeeping of reserved vs. free resources
//!
//! Every open order must be backed by a reservation here before it reaches a
//! matching engine. Cash and shares follow different contracts:
//!
//! - cash reservations cap silently at the unallocated amount and never fail;
//! - share reservations are all-or-nothing, because over-reserving shares
//!   would let two orders sell the same share.
//!
//! Invariant everywhere: `0 <= allocated <= held`. A violation is a broken
//! accounting model, not a bad input, and panics.

use crate::errors::AllocationError;
use crate::ids::InstrumentId;
use crate::numeric::{Price, Volume};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cash holdings with a reserved portion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashLedger {
    held: Decimal,
    allocated: Decimal,
}

impl CashLedger {
    /// Create a ledger holding `held` units of cash, none reserved.
    ///
    /// # Panics
    /// Panics if `held` is negative.
    pub fn new(held: Decimal) -> Self {
        assert!(held >= Decimal::ZERO, "Cash holdings must be non-negative");
        Self {
            held,
            allocated: Decimal::ZERO,
        }
    }

    pub fn held(&self) -> Decimal {
        self.held
    }

    pub fn allocated(&self) -> Decimal {
        self.allocated
    }

    pub fn unallocated(&self) -> Decimal {
        self.held - self.allocated
    }

    /// Check ledger invariant: 0 <= allocated <= held
    pub fn check_invariant(&self) -> bool {
        self.allocated >= Decimal::ZERO && self.allocated <= self.held
    }

    /// Reserve up to `amount`, capping silently at the unallocated balance.
    /// Returns the amount actually reserved.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn allocate(&mut self, amount: Decimal) -> Decimal {
        assert!(amount >= Decimal::ZERO, "Allocation amount must be non-negative");

        let granted = amount.min(self.unallocated());
        self.allocated += granted;

        assert!(self.check_invariant(), "Invariant violated after allocate");
        granted
    }

    /// Release a previous reservation, clamping to the currently allocated
    /// amount to tolerate rounding. Returns the amount actually released.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn disallocate(&mut self, amount: Decimal) -> Decimal {
        assert!(amount >= Decimal::ZERO, "Release amount must be non-negative");

        let released = amount.min(self.allocated);
        self.allocated -= released;

        assert!(self.check_invariant(), "Invariant violated after disallocate");
        released
    }

    /// Credit new cash (settlement proceeds, endowment).
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn deposit(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Deposit amount must be non-negative");
        self.held += amount;
        assert!(self.check_invariant(), "Invariant violated after deposit");
    }

    /// Remove unallocated cash (settlement payment). Returns false if the
    /// amount exceeds the unallocated balance; committed funds stay put.
    pub fn withdraw(&mut self, amount: Decimal) -> bool {
        assert!(amount >= Decimal::ZERO, "Withdrawal amount must be non-negative");
        if amount > self.unallocated() {
            return false;
        }
        self.held -= amount;
        assert!(self.check_invariant(), "Invariant violated after withdraw");
        true
    }
}

/// Share holdings in one instrument with a reserved portion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    held: Volume,
    allocated: Volume,
}

impl ShareLedger {
    pub fn new(held: Volume) -> Self {
        Self {
            held,
            allocated: Volume::zero(),
        }
    }

    pub fn held(&self) -> Volume {
        self.held
    }

    pub fn allocated(&self) -> Volume {
        self.allocated
    }

    pub fn unallocated(&self) -> Volume {
        self.held
            .checked_sub(self.allocated)
            .expect("Share ledger invariant violated: allocated > held")
    }

    pub fn check_invariant(&self) -> bool {
        self.allocated <= self.held
    }
}

/// A party's complete allocation ledger: one cash ledger plus one share
/// ledger per instrument it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    cash: CashLedger,
    shares: BTreeMap<InstrumentId, ShareLedger>,
}

impl Portfolio {
    pub fn new(cash: Decimal) -> Self {
        Self {
            cash: CashLedger::new(cash),
            shares: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> &CashLedger {
        &self.cash
    }

    pub fn shares(&self, instrument: &InstrumentId) -> Option<&ShareLedger> {
        self.shares.get(instrument)
    }

    /// Reserve up to `amount` of cash; caps silently. Returns the amount
    /// actually reserved.
    pub fn allocate_cash(&mut self, amount: Decimal) -> Decimal {
        self.cash.allocate(amount)
    }

    /// Release reserved cash; clamps to the allocated amount.
    pub fn disallocate_cash(&mut self, amount: Decimal) -> Decimal {
        self.cash.disallocate(amount)
    }

    /// Credit new cash (settlement proceeds, endowment).
    pub fn deposit_cash(&mut self, amount: Decimal) {
        self.cash.deposit(amount);
    }

    /// Remove unallocated cash (settlement payment). Returns false if the
    /// amount exceeds the unallocated balance.
    pub fn withdraw_cash(&mut self, amount: Decimal) -> bool {
        self.cash.withdraw(amount)
    }

    /// Reserve shares, all-or-nothing. On failure the ledger is unchanged.
    pub fn allocate_shares(
        &mut self,
        instrument: &InstrumentId,
        volume: Volume,
    ) -> Result<(), AllocationError> {
        let ledger = self.shares.get_mut(instrument).ok_or_else(|| {
            AllocationError::UnknownShareClass {
                instrument: instrument.to_string(),
            }
        })?;

        if volume > ledger.unallocated() {
            return Err(AllocationError::InsufficientShares {
                instrument: instrument.to_string(),
                requested: volume.to_string(),
                unallocated: ledger.unallocated().to_string(),
            });
        }

        ledger.allocated = ledger.allocated + volume;
        assert!(ledger.check_invariant(), "Invariant violated after share allocate");
        Ok(())
    }

    /// Release reserved shares. Over-release is reported, not clamped.
    pub fn disallocate_shares(
        &mut self,
        instrument: &InstrumentId,
        volume: Volume,
    ) -> Result<(), AllocationError> {
        let ledger = self.shares.get_mut(instrument).ok_or_else(|| {
            AllocationError::UnknownShareClass {
                instrument: instrument.to_string(),
            }
        })?;

        match ledger.allocated.checked_sub(volume) {
            Some(remaining) => {
                ledger.allocated = remaining;
                Ok(())
            }
            None => Err(AllocationError::ExcessShareRelease {
                instrument: instrument.to_string(),
                requested: volume.to_string(),
                allocated: ledger.allocated.to_string(),
            }),
        }
    }

    /// Credit newly acquired shares (settlement delivery, endowment).
    pub fn add_shares(&mut self, instrument: &InstrumentId, volume: Volume) {
        let ledger = self
            .shares
            .entry(instrument.clone())
            .or_insert_with(|| ShareLedger::new(Volume::zero()));
        ledger.held = ledger.held + volume;
    }

    /// Remove unallocated shares (settlement delivery). Returns false if the
    /// volume exceeds the unallocated holding.
    pub fn remove_shares(&mut self, instrument: &InstrumentId, volume: Volume) -> bool {
        let Some(ledger) = self.shares.get_mut(instrument) else {
            return false;
        };
        if volume > ledger.unallocated() {
            return false;
        }
        ledger.held = ledger
            .held
            .checked_sub(volume)
            .expect("unallocated check bounds the subtraction");
        assert!(ledger.check_invariant(), "Invariant violated after share removal");
        true
    }

    /// Diagnostic: compare recorded allocations against an expectation
    /// recomputed from open orders. The caller (a venue, or the simulation
    /// context summing over venues) computes what each open order should
    /// have reserved, because the reservation rule is market policy.
    pub fn reconcile(
        &self,
        expected_cash: Decimal,
        expected_shares: &BTreeMap<InstrumentId, Volume>,
    ) -> bool {
        if self.cash.allocated() != expected_cash {
            return false;
        }
        let mut remaining = expected_shares.clone();
        for (instrument, ledger) in &self.shares {
            let expected = remaining.remove(instrument).unwrap_or_else(Volume::zero);
            if ledger.allocated() != expected {
                return false;
            }
        }
        remaining.is_empty()
    }
}

/// Build a buy-side cash requirement from size and limit price.
pub fn cash_required(size: Volume, price: Price) -> Decimal {
    size.as_decimal() * price.as_decimal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stock() -> InstrumentId {
        InstrumentId::new("STOCK/0")
    }

    #[test]
    fn test_cash_allocate_caps() {
        let mut ledger = CashLedger::new(Decimal::from(100));

        let granted = ledger.allocate(Decimal::from(60));
        assert_eq!(granted, Decimal::from(60));

        // Second reservation caps at the remaining 40
        let granted = ledger.allocate(Decimal::from(60));
        assert_eq!(granted, Decimal::from(40));
        assert_eq!(ledger.unallocated(), Decimal::ZERO);
        assert!(ledger.check_invariant());
    }

    #[test]
    fn test_cash_disallocate_clamps() {
        let mut ledger = CashLedger::new(Decimal::from(100));
        ledger.allocate(Decimal::from(30));

        let released = ledger.disallocate(Decimal::from(50));
        assert_eq!(released, Decimal::from(30));
        assert_eq!(ledger.allocated(), Decimal::ZERO);
    }

    #[test]
    fn test_cash_withdraw_respects_reservations() {
        let mut ledger = CashLedger::new(Decimal::from(100));
        ledger.allocate(Decimal::from(80));

        assert!(!ledger.withdraw(Decimal::from(30)));
        assert_eq!(ledger.held(), Decimal::from(100));

        assert!(ledger.withdraw(Decimal::from(20)));
        assert_eq!(ledger.held(), Decimal::from(80));
    }

    #[test]
    fn test_share_allocate_all_or_nothing() {
        let mut portfolio = Portfolio::new(Decimal::ZERO);
        portfolio.add_shares(&stock(), Volume::from_u64(10));

        assert!(portfolio.allocate_shares(&stock(), Volume::from_u64(6)).is_ok());

        // 6 of 10 reserved; asking for 5 more must fail without mutation
        let err = portfolio
            .allocate_shares(&stock(), Volume::from_u64(5))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InsufficientShares { .. }));
        assert_eq!(
            portfolio.shares(&stock()).unwrap().allocated(),
            Volume::from_u64(6)
        );

        assert!(portfolio.allocate_shares(&stock(), Volume::from_u64(4)).is_ok());
    }

    #[test]
    fn test_share_disallocate_excess_reported() {
        let mut portfolio = Portfolio::new(Decimal::ZERO);
        portfolio.add_shares(&stock(), Volume::from_u64(10));
        portfolio.allocate_shares(&stock(), Volume::from_u64(4)).unwrap();

        let err = portfolio
            .disallocate_shares(&stock(), Volume::from_u64(5))
            .unwrap_err();
        assert!(matches!(err, AllocationError::ExcessShareRelease { .. }));

        assert!(portfolio
            .disallocate_shares(&stock(), Volume::from_u64(4))
            .is_ok());
    }

    #[test]
    fn test_allocate_shares_unknown_class() {
        let mut portfolio = Portfolio::new(Decimal::ZERO);
        let err = portfolio
            .allocate_shares(&stock(), Volume::from_u64(1))
            .unwrap_err();
        assert!(matches!(err, AllocationError::UnknownShareClass { .. }));
    }

    #[test]
    fn test_remove_shares_respects_reservations() {
        let mut portfolio = Portfolio::new(Decimal::ZERO);
        portfolio.add_shares(&stock(), Volume::from_u64(10));
        portfolio.allocate_shares(&stock(), Volume::from_u64(8)).unwrap();

        assert!(!portfolio.remove_shares(&stock(), Volume::from_u64(5)));
        assert!(portfolio.remove_shares(&stock(), Volume::from_u64(2)));
        assert_eq!(
            portfolio.shares(&stock()).unwrap().held(),
            Volume::from_u64(8)
        );
    }

    #[test]
    fn test_reconcile() {
        let mut portfolio = Portfolio::new(Decimal::from(50));
        assert!(portfolio.reconcile(Decimal::ZERO, &BTreeMap::new()));

        portfolio.allocate_cash(Decimal::from(20));
        assert!(!portfolio.reconcile(Decimal::ZERO, &BTreeMap::new()));
        assert!(portfolio.reconcile(Decimal::from(20), &BTreeMap::new()));

        portfolio.add_shares(&stock(), Volume::from_u64(5));
        portfolio.allocate_shares(&stock(), Volume::from_u64(3)).unwrap();
        let expected: BTreeMap<_, _> = [(stock(), Volume::from_u64(3))].into();
        assert!(portfolio.reconcile(Decimal::from(20), &expected));
    }

    proptest! {
        /// Allocation safety: allocated never exceeds held for any sequence
        /// of allocate/disallocate calls.
        #[test]
        fn prop_cash_allocation_safety(
            held in 0u64..1_000_000,
            ops in proptest::collection::vec((any::<bool>(), 0u64..1_000_000), 0..64),
        ) {
            let mut ledger = CashLedger::new(Decimal::from(held));
            for (is_alloc, amount) in ops {
                let amount = Decimal::from(amount);
                if is_alloc {
                    ledger.allocate(amount);
                } else {
                    ledger.disallocate(amount);
                }
                prop_assert!(ledger.check_invariant());
            }
        }

        /// Share reservations fail exactly when the request exceeds the
        /// unallocated volume, leaving state unchanged on failure.
        #[test]
        fn prop_share_allocation_all_or_nothing(
            held in 0u64..10_000,
            requests in proptest::collection::vec(0u64..10_000, 0..32),
        ) {
            let mut portfolio = Portfolio::new(Decimal::ZERO);
            portfolio.add_shares(&stock(), Volume::from_u64(held));

            for request in requests {
                let before = portfolio.shares(&stock()).unwrap().allocated();
                let unallocated = portfolio.shares(&stock()).unwrap().unallocated();
                let result = portfolio.allocate_shares(&stock(), Volume::from_u64(request));

                if Volume::from_u64(request) > unallocated {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(
                        portfolio.shares(&stock()).unwrap().allocated(), before
                    );
                } else {
                    prop_assert!(result.is_ok());
                }
                prop_assert!(portfolio.shares(&stock()).unwrap().check_invariant());
            }
        }
    }
}
