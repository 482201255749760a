//! Clearing house
//!
//! Each clearing cycle the house polls every registered participant for a
//! market response (a priced desired volume on the supply or demand side),
//! feeds the two sides to its rationing algorithm and reports the resulting
//! allocations to a settlement collaborator.
//!
//! The house is constructed per simulation and passed around explicitly;
//! there is no process-wide registry, so independent simulations and tests
//! never share state.

use crate::node::{total_usable, Node};
use crate::rationing::RationingAlgorithm;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::errors::AlgorithmError;
use types::ids::{InstrumentId, PartyId};

/// What participants see when asked for their response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub instrument: InstrumentId,
    pub cycle: u64,
    /// Last cycle's clearing price, if any cycle has cleared yet.
    pub reference_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseSide {
    Supply,
    Demand,
}

/// A participant's desired volume at a price for one clearing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketResponse {
    pub side: ResponseSide,
    pub price: Decimal,
    pub volume: Decimal,
}

/// One participant's result from a clearing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub party_id: PartyId,
    pub side: ResponseSide,
    pub desired: Decimal,
    pub allocated: Decimal,
}

/// Outcome of one clearing cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingSummary {
    pub instrument: InstrumentId,
    pub cycle: u64,
    /// Usable-volume-weighted average response price; None when nothing
    /// cleared.
    pub clearing_price: Option<Decimal>,
    pub cleared_volume: Decimal,
    pub allocations: Vec<Allocation>,
}

/// Registry and orchestrator of heterogeneous clearing cycles.
pub struct ClearingHouse<A: RationingAlgorithm> {
    name: String,
    algorithm: A,
    lenders: Vec<PartyId>,
    borrowers: Vec<PartyId>,
    stock_participants: Vec<PartyId>,
    last_price: Option<Decimal>,
}

impl<A: RationingAlgorithm> ClearingHouse<A> {
    pub fn new(name: impl Into<String>, algorithm: A) -> Self {
        Self {
            name: name.into(),
            algorithm,
            lenders: Vec::new(),
            borrowers: Vec::new(),
            stock_participants: Vec::new(),
            last_price: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    pub fn add_lender(&mut self, party_id: PartyId) {
        push_unique(&mut self.lenders, party_id);
    }

    pub fn add_borrower(&mut self, party_id: PartyId) {
        push_unique(&mut self.borrowers, party_id);
    }

    pub fn add_stock_participant(&mut self, party_id: PartyId) {
        push_unique(&mut self.stock_participants, party_id);
    }

    /// Drop a party from every registry. Returns whether it was registered
    /// anywhere.
    pub fn remove_participant(&mut self, party_id: &PartyId) -> bool {
        let mut removed = false;
        for registry in [
            &mut self.lenders,
            &mut self.borrowers,
            &mut self.stock_participants,
        ] {
            if let Some(pos) = registry.iter().position(|p| p == party_id) {
                registry.remove(pos);
                removed = true;
            }
        }
        removed
    }

    pub fn participant_count(&self) -> usize {
        self.participants().len()
    }

    /// All registered parties in registration order, deduplicated. This is
    /// the enumeration order the rationing algorithm sees, so it is part of
    /// the determinism contract.
    fn participants(&self) -> Vec<PartyId> {
        let mut seen = Vec::new();
        for party_id in self
            .lenders
            .iter()
            .chain(self.borrowers.iter())
            .chain(self.stock_participants.iter())
        {
            push_unique(&mut seen, *party_id);
        }
        seen
    }

    /// Run one clearing cycle.
    ///
    /// `respond` is polled once per registered participant; None means the
    /// participant sits this cycle out. `settle` is called once per nonzero
    /// allocation with the allocation and the clearing price.
    pub fn clear<F, S>(
        &mut self,
        instrument: &InstrumentId,
        cycle: u64,
        mut respond: F,
        mut settle: S,
    ) -> Result<ClearingSummary, AlgorithmError>
    where
        F: FnMut(&PartyId, &MarketInfo) -> Option<MarketResponse>,
        S: FnMut(&Allocation, Decimal),
    {
        let info = MarketInfo {
            instrument: instrument.clone(),
            cycle,
            reference_price: self.last_price,
        };

        let mut supply = Vec::new();
        let mut demand = Vec::new();
        for party_id in self.participants() {
            let Some(response) = respond(&party_id, &info) else {
                continue;
            };
            let node = Node::new(party_id, response.price, response.volume)?;
            match response.side {
                ResponseSide::Supply => supply.push(node),
                ResponseSide::Demand => demand.push(node),
            }
        }
        debug!(
            house = %self.name,
            supply = supply.len(),
            demand = demand.len(),
            "collected market responses"
        );

        self.algorithm.ration(&mut supply, &mut demand)?;

        let cleared_volume = total_usable(&supply);
        let clearing_price = weighted_price(&supply, &demand);
        if let Some(price) = clearing_price {
            self.last_price = Some(price);
        }

        let mut allocations = Vec::with_capacity(supply.len() + demand.len());
        for (nodes, side) in [(supply, ResponseSide::Supply), (demand, ResponseSide::Demand)] {
            for node in nodes {
                let allocation = Allocation {
                    party_id: node.party_id,
                    side,
                    desired: node.desired,
                    allocated: node.usable,
                };
                if !allocation.allocated.is_zero() {
                    let price = clearing_price.expect("nonzero allocation implies a price");
                    settle(&allocation, price);
                }
                allocations.push(allocation);
            }
        }

        info!(
            house = %self.name,
            instrument = %instrument,
            cycle,
            volume = %cleared_volume,
            "clearing cycle complete"
        );
        Ok(ClearingSummary {
            instrument: instrument.clone(),
            cycle,
            clearing_price,
            cleared_volume,
            allocations,
        })
    }
}

fn push_unique(registry: &mut Vec<PartyId>, party_id: PartyId) {
    if !registry.contains(&party_id) {
        registry.push(party_id);
    }
}

/// Usable-volume-weighted average price over both sides.
fn weighted_price(supply: &[Node], demand: &[Node]) -> Option<Decimal> {
    let mut value = Decimal::ZERO;
    let mut volume = Decimal::ZERO;
    for node in supply.iter().chain(demand.iter()) {
        value += node.price * node.usable;
        volume += node.usable;
    }
    if volume.is_zero() {
        None
    } else {
        Some(value / volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rationing::HomogeneousRationing;
    use std::collections::HashMap;

    fn loan() -> InstrumentId {
        InstrumentId::new("LOAN/3")
    }

    fn house() -> ClearingHouse<HomogeneousRationing> {
        ClearingHouse::new("interbank clearing", HomogeneousRationing::new())
    }

    #[test]
    fn test_registration_and_removal() {
        let mut house = house();
        let bank = PartyId::new();

        house.add_lender(bank);
        house.add_lender(bank);
        house.add_borrower(bank);
        assert_eq!(house.participant_count(), 1);

        assert!(house.remove_participant(&bank));
        assert_eq!(house.participant_count(), 0);
        assert!(!house.remove_participant(&bank));
    }

    #[test]
    fn test_clearing_cycle_rations_and_settles() {
        let mut house = house();
        let lender_a = PartyId::new();
        let lender_b = PartyId::new();
        let borrower = PartyId::new();
        house.add_lender(lender_a);
        house.add_lender(lender_b);
        house.add_borrower(borrower);

        let offers: HashMap<PartyId, MarketResponse> = [
            (
                lender_a,
                MarketResponse {
                    side: ResponseSide::Supply,
                    price: Decimal::from(5),
                    volume: Decimal::from(10),
                },
            ),
            (
                lender_b,
                MarketResponse {
                    side: ResponseSide::Supply,
                    price: Decimal::from(5),
                    volume: Decimal::from(30),
                },
            ),
            (
                borrower,
                MarketResponse {
                    side: ResponseSide::Demand,
                    price: Decimal::from(5),
                    volume: Decimal::from(20),
                },
            ),
        ]
        .into();

        let mut settled = Vec::new();
        let summary = house
            .clear(
                &loan(),
                0,
                |party_id, _| offers.get(party_id).cloned(),
                |allocation, price| settled.push((allocation.party_id, allocation.allocated, price)),
            )
            .unwrap();

        assert_eq!(summary.cleared_volume, Decimal::from(20));
        assert_eq!(summary.clearing_price, Some(Decimal::from(5)));

        // Supply of 40 halves against demand of 20
        let by_party: HashMap<PartyId, Decimal> = summary
            .allocations
            .iter()
            .map(|a| (a.party_id, a.allocated))
            .collect();
        assert_eq!(by_party[&lender_a], Decimal::from(5));
        assert_eq!(by_party[&lender_b], Decimal::from(15));
        assert_eq!(by_party[&borrower], Decimal::from(20));
        assert_eq!(settled.len(), 3);
    }

    #[test]
    fn test_absent_responses_are_skipped() {
        let mut house = house();
        let lender = PartyId::new();
        let silent = PartyId::new();
        house.add_lender(lender);
        house.add_borrower(silent);

        let summary = house
            .clear(
                &loan(),
                0,
                |party_id, _| {
                    (party_id == &lender).then(|| MarketResponse {
                        side: ResponseSide::Supply,
                        price: Decimal::from(5),
                        volume: Decimal::from(10),
                    })
                },
                |_, _| panic!("nothing should settle without a counterside"),
            )
            .unwrap();

        assert_eq!(summary.cleared_volume, Decimal::ZERO);
        assert_eq!(summary.clearing_price, None);
        assert_eq!(summary.allocations.len(), 1);
        assert!(summary.allocations[0].allocated.is_zero());
    }

    #[test]
    fn test_negative_response_is_a_caller_bug() {
        let mut house = house();
        let lender = PartyId::new();
        house.add_lender(lender);

        let err = house
            .clear(
                &loan(),
                0,
                |_, _| {
                    Some(MarketResponse {
                        side: ResponseSide::Supply,
                        price: Decimal::from(5),
                        volume: Decimal::from(-10),
                    })
                },
                |_, _| {},
            )
            .unwrap_err();
        assert!(matches!(err, AlgorithmError::NegativeVolume { .. }));
    }

    #[test]
    fn test_reference_price_carries_forward() {
        let mut house = house();
        let lender = PartyId::new();
        let borrower = PartyId::new();
        house.add_lender(lender);
        house.add_borrower(borrower);

        let respond = |party_id: &PartyId, info: &MarketInfo| {
            assert_eq!(info.instrument, loan());
            Some(MarketResponse {
                side: if party_id == &lender {
                    ResponseSide::Supply
                } else {
                    ResponseSide::Demand
                },
                price: Decimal::from(5),
                volume: Decimal::from(10),
            })
        };
        house.clear(&loan(), 0, respond, |_, _| {}).unwrap();
        assert_eq!(house.last_price(), Some(Decimal::from(5)));

        let mut seen_reference = None;
        house
            .clear(
                &loan(),
                1,
                |party_id, info| {
                    seen_reference = info.reference_price;
                    respond(party_id, info)
                },
                |_, _| {},
            )
            .unwrap();
        assert_eq!(seen_reference, Some(Decimal::from(5)));
    }

    #[test]
    fn test_empty_house_clears_nothing() {
        let mut house = house();
        let summary = house
            .clear(&loan(), 0, |_, _| None, |_, _| {})
            .unwrap();
        assert!(summary.allocations.is_empty());
        assert_eq!(summary.cleared_volume, Decimal::ZERO);
    }
}
