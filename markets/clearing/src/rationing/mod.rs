//! Rationing algorithms
//!
//! Given a left and a right node collection whose aggregate desired volumes
//! may differ, a rationing algorithm sets every node's `usable` volume so
//! both sides sum to `min(total_left, total_right)`. The short side always
//! receives its full desired volume; the algorithms differ only in how the
//! long side absorbs the shortfall.

pub mod homogeneous;
pub mod random_deny;

pub use homogeneous::HomogeneousRationing;
pub use random_deny::RandomDenyRationing;

use crate::node::{total_desired, total_usable, Node};
use rust_decimal::Decimal;
use types::errors::AlgorithmError;

/// Numerical tolerance for the conservation invariant.
pub fn conservation_tolerance() -> Decimal {
    // 1e-8
    Decimal::new(1, 8)
}

/// A policy for balancing two sides of a clearing pass.
pub trait RationingAlgorithm {
    /// Set `usable` on every node such that `usable <= desired` everywhere
    /// and both sides' usable totals are equal within tolerance. Either
    /// collection may be empty.
    fn ration(&mut self, left: &mut [Node], right: &mut [Node]) -> Result<(), AlgorithmError>;
}

/// Reject node collections carrying negative prices or volumes. Nodes built
/// through `Node::new` always pass; this guards hand-assembled input.
pub(crate) fn validate(nodes: &[Node]) -> Result<(), AlgorithmError> {
    for node in nodes {
        if node.price < Decimal::ZERO {
            return Err(AlgorithmError::NegativePrice {
                price: node.price.to_string(),
            });
        }
        if node.desired < Decimal::ZERO {
            return Err(AlgorithmError::NegativeVolume {
                volume: node.desired.to_string(),
            });
        }
    }
    Ok(())
}

/// Conservation check after a rationing pass. A violation is a broken
/// algorithm, not bad input.
///
/// # Panics
/// Panics if the usable totals of the two sides differ beyond tolerance.
pub fn assert_conserved(left: &[Node], right: &[Node]) {
    let diff = (total_usable(left) - total_usable(right)).abs();
    assert!(
        diff < conservation_tolerance(),
        "Rationing conservation violated: usable totals differ by {diff}"
    );
}

/// The volume both sides clear: the smaller aggregate desired volume.
pub(crate) fn clearing_target(left: &[Node], right: &[Node]) -> Decimal {
    total_desired(left).min(total_desired(right))
}

/// Grant every node its full desired volume.
pub(crate) fn grant_all(nodes: &mut [Node]) {
    for node in nodes {
        node.usable = node.desired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::PartyId;

    fn node(desired: u64) -> Node {
        Node::new(PartyId::new(), Decimal::ONE, Decimal::from(desired)).unwrap()
    }

    #[test]
    fn test_clearing_target_is_short_side() {
        let left = vec![node(10), node(30)];
        let right = vec![node(25)];
        assert_eq!(clearing_target(&left, &right), Decimal::from(25));
    }

    #[test]
    fn test_validate_rejects_hand_built_negative() {
        let mut bad = node(5);
        bad.desired = Decimal::from(-5);
        assert!(validate(&[bad]).is_err());
    }

    #[test]
    #[should_panic(expected = "conservation violated")]
    fn test_assert_conserved_panics_on_imbalance() {
        let mut left = vec![node(10)];
        grant_all(&mut left);
        let right = vec![node(10)];
        assert_conserved(&left, &right);
    }
}
