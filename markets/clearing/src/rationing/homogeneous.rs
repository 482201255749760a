//! Proportional rationing
//!
//! Every node on the long side is scaled by the same ratio, so every
//! participant absorbs the shortfall in proportion to its desired volume
//! and nobody is fully denied.

use crate::node::{total_desired, Node};
use crate::rationing::{assert_conserved, clearing_target, validate, RationingAlgorithm};
use rust_decimal::Decimal;
use tracing::debug;
use types::errors::AlgorithmError;

#[derive(Debug, Clone, Copy, Default)]
pub struct HomogeneousRationing;

impl HomogeneousRationing {
    pub fn new() -> Self {
        Self
    }
}

impl RationingAlgorithm for HomogeneousRationing {
    fn ration(&mut self, left: &mut [Node], right: &mut [Node]) -> Result<(), AlgorithmError> {
        validate(left)?;
        validate(right)?;

        let target = clearing_target(left, right);
        debug!(%target, "homogeneous rationing pass");
        scale_to(left, target);
        scale_to(right, target);

        assert_conserved(left, right);
        Ok(())
    }
}

/// Scale a side so its usable total equals `target`. The last nonzero node
/// absorbs the division residual so the side sums to the target exactly.
fn scale_to(nodes: &mut [Node], target: Decimal) {
    let total = total_desired(nodes);
    if total.is_zero() || target.is_zero() {
        for node in nodes {
            node.usable = Decimal::ZERO;
        }
        return;
    }

    let ratio = target / total;
    let mut granted = Decimal::ZERO;
    let mut last_nonzero: Option<usize> = None;
    for (i, node) in nodes.iter_mut().enumerate() {
        node.usable = (node.desired * ratio).min(node.desired);
        granted += node.usable;
        if !node.desired.is_zero() {
            last_nonzero = Some(i);
        }
    }

    if let Some(i) = last_nonzero {
        let residual = target - granted;
        let corrected = (nodes[i].usable + residual).min(nodes[i].desired);
        if corrected >= Decimal::ZERO {
            nodes[i].usable = corrected;
        }
    }
}
