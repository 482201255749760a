//! Settlement collaborator
//!
//! Turns matched volume into actual cash and share movement. Matching only
//! releases reservations; nothing moves until settlement. A settlement
//! failure after a successful reservation means the reservation accounting
//! is broken, so these errors are surfaced, never swallowed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::errors::SettlementError;
use types::ids::{ContractId, InstrumentId, PartyId};
use types::numeric::Volume;
use types::party::Parties;
use types::trade::Trade;

/// An outstanding loan created by settling matched credit volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanContract {
    pub contract_id: ContractId,
    pub instrument: InstrumentId,
    pub lender: PartyId,
    pub borrower: PartyId,
    pub principal: Decimal,
    /// Per-term interest rate
    pub rate: Decimal,
    pub issued_cycle: u64,
    pub maturity_cycle: u64,
}

impl LoanContract {
    /// Principal plus interest, due at maturity.
    pub fn repayment_due(&self) -> Decimal {
        self.principal * (Decimal::ONE + self.rate)
    }
}

/// Applies trades and cleared allocations to party portfolios and keeps the
/// book of outstanding loan contracts.
#[derive(Debug, Default)]
pub struct SettlementAgent {
    loans: Vec<LoanContract>,
}

impl SettlementAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loans(&self) -> &[LoanContract] {
        &self.loans
    }

    /// Settle an equity trade: the buyer pays `price x volume` and receives
    /// the shares, the seller delivers the shares and receives the cash.
    /// Both movements are checked before either is applied.
    pub fn settle_share_trade(
        &mut self,
        parties: &mut Parties,
        trade: &mut Trade,
    ) -> Result<(), SettlementError> {
        let value = trade.trade_value();

        let buyer = parties
            .get(&trade.buyer)
            .ok_or_else(|| SettlementError::UnknownParty {
                party: trade.buyer.to_string(),
            })?;
        let available = buyer.portfolio.cash().unallocated();
        if available < value {
            return Err(SettlementError::InsufficientFunds {
                party: trade.buyer.to_string(),
                required: value.to_string(),
                available: available.to_string(),
            });
        }

        let seller = parties
            .get(&trade.seller)
            .ok_or_else(|| SettlementError::UnknownParty {
                party: trade.seller.to_string(),
            })?;
        let deliverable = seller
            .portfolio
            .shares(&trade.instrument)
            .map(|ledger| ledger.unallocated())
            .unwrap_or(Volume::zero());
        if deliverable < trade.volume {
            return Err(SettlementError::InsufficientShares {
                party: trade.seller.to_string(),
                instrument: trade.instrument.to_string(),
            });
        }

        let buyer = parties.get_mut(&trade.buyer).expect("checked above");
        assert!(buyer.portfolio.withdraw_cash(value), "checked above");
        buyer.portfolio.add_shares(&trade.instrument, trade.volume);

        let seller = parties.get_mut(&trade.seller).expect("checked above");
        assert!(
            seller.portfolio.remove_shares(&trade.instrument, trade.volume),
            "checked above"
        );
        seller.portfolio.deposit_cash(value);

        trade.settle();
        debug!(trade = %trade.trade_id, value = %value, "share trade settled");
        Ok(())
    }

    /// Originate a loan: principal moves from lender to borrower now and a
    /// contract records the repayment due at maturity.
    #[allow(clippy::too_many_arguments)]
    pub fn originate_loan(
        &mut self,
        parties: &mut Parties,
        instrument: &InstrumentId,
        lender: PartyId,
        borrower: PartyId,
        principal: Decimal,
        rate: Decimal,
        cycle: u64,
        term: u64,
    ) -> Result<ContractId, SettlementError> {
        {
            let lender_party =
                parties
                    .get(&lender)
                    .ok_or_else(|| SettlementError::UnknownParty {
                        party: lender.to_string(),
                    })?;
            let available = lender_party.portfolio.cash().unallocated();
            if available < principal {
                return Err(SettlementError::InsufficientFunds {
                    party: lender.to_string(),
                    required: principal.to_string(),
                    available: available.to_string(),
                });
            }
        }
        if !parties.contains(&borrower) {
            return Err(SettlementError::UnknownParty {
                party: borrower.to_string(),
            });
        }

        let lender_party = parties.get_mut(&lender).expect("checked above");
        assert!(lender_party.portfolio.withdraw_cash(principal), "checked above");
        parties
            .get_mut(&borrower)
            .expect("checked above")
            .portfolio
            .deposit_cash(principal);

        let contract = LoanContract {
            contract_id: ContractId::new(),
            instrument: instrument.clone(),
            lender,
            borrower,
            principal,
            rate,
            issued_cycle: cycle,
            maturity_cycle: cycle + term,
        };
        let contract_id = contract.contract_id;
        debug!(contract = %contract_id, principal = %principal, rate = %rate, "loan originated");
        self.loans.push(contract);
        Ok(contract_id)
    }

    /// Contracts maturing at `cycle`, in origination order.
    pub fn due_at(&self, cycle: u64) -> Vec<ContractId> {
        self.loans
            .iter()
            .filter(|loan| loan.maturity_cycle == cycle)
            .map(|loan| loan.contract_id)
            .collect()
    }

    /// Repay a loan: the borrower pays principal plus interest and the
    /// contract is retired. The contract stays open if the borrower cannot
    /// pay.
    pub fn repay(
        &mut self,
        parties: &mut Parties,
        contract_id: &ContractId,
    ) -> Result<(), SettlementError> {
        let position = self
            .loans
            .iter()
            .position(|loan| &loan.contract_id == contract_id)
            .ok_or_else(|| SettlementError::UnknownContract {
                contract: contract_id.to_string(),
            })?;
        let loan = &self.loans[position];
        let due = loan.repayment_due();

        let borrower =
            parties
                .get(&loan.borrower)
                .ok_or_else(|| SettlementError::UnknownParty {
                    party: loan.borrower.to_string(),
                })?;
        let available = borrower.portfolio.cash().unallocated();
        if available < due {
            warn!(contract = %contract_id, due = %due, available = %available, "borrower cannot repay");
            return Err(SettlementError::InsufficientFunds {
                party: loan.borrower.to_string(),
                required: due.to_string(),
                available: available.to_string(),
            });
        }

        let loan = self.loans.remove(position);
        let borrower = parties.get_mut(&loan.borrower).expect("checked above");
        assert!(borrower.portfolio.withdraw_cash(due), "checked above");
        parties
            .get_mut(&loan.lender)
            .expect("lender must outlive its loans")
            .portfolio
            .deposit_cash(due);

        debug!(contract = %loan.contract_id, repaid = %due, "loan repaid");
        Ok(())
    }
}
