//! Rationing nodes
//!
//! A node is one participant's response at one price: how much it wants
//! (`desired`) and, after rationing, how much it actually gets (`usable`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::AlgorithmError;
use types::ids::PartyId;

/// One participant's priced volume in a clearing pass.
///
/// `price` and `desired` are inputs and never change; `usable` is written
/// by the rationing algorithm and satisfies `0 <= usable <= desired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub party_id: PartyId,
    pub price: Decimal,
    pub desired: Decimal,
    pub usable: Decimal,
}

impl Node {
    /// Build a node with zero usable volume. Rejects negative price or
    /// desired volume; those indicate a bug in the caller, not a market
    /// condition.
    pub fn new(party_id: PartyId, price: Decimal, desired: Decimal) -> Result<Self, AlgorithmError> {
        if price < Decimal::ZERO {
            return Err(AlgorithmError::NegativePrice {
                price: price.to_string(),
            });
        }
        if desired < Decimal::ZERO {
            return Err(AlgorithmError::NegativeVolume {
                volume: desired.to_string(),
            });
        }
        Ok(Self {
            party_id,
            price,
            desired,
            usable: Decimal::ZERO,
        })
    }

    pub fn denied(&self) -> Decimal {
        self.desired - self.usable
    }
}

/// Sum of desired volume over a node collection.
pub fn total_desired(nodes: &[Node]) -> Decimal {
    nodes.iter().map(|n| n.desired).sum()
}

/// Sum of usable volume over a node collection.
pub fn total_usable(nodes: &[Node]) -> Decimal {
    nodes.iter().map(|n| n.usable).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_unallocated() {
        let node = Node::new(PartyId::new(), Decimal::from(5), Decimal::from(10)).unwrap();
        assert_eq!(node.usable, Decimal::ZERO);
        assert_eq!(node.denied(), Decimal::from(10));
    }

    #[test]
    fn test_new_rejects_negative_price() {
        let err = Node::new(PartyId::new(), Decimal::from(-1), Decimal::from(10)).unwrap_err();
        assert!(matches!(err, AlgorithmError::NegativePrice { .. }));
    }

    #[test]
    fn test_new_rejects_negative_volume() {
        let err = Node::new(PartyId::new(), Decimal::from(5), Decimal::from(-2)).unwrap_err();
        assert!(matches!(err, AlgorithmError::NegativeVolume { .. }));
    }

    #[test]
    fn test_totals() {
        let nodes = vec![
            Node::new(PartyId::new(), Decimal::ONE, Decimal::from(3)).unwrap(),
            Node::new(PartyId::new(), Decimal::ONE, Decimal::from(7)).unwrap(),
        ];
        assert_eq!(total_desired(&nodes), Decimal::from(10));
        assert_eq!(total_usable(&nodes), Decimal::ZERO);
    }
}
