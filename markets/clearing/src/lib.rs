//! Heterogeneous clearing
//!
//! A `ClearingHouse` polls registered participants for priced desired
//! volumes each cycle and balances supply against demand with a pluggable
//! `RationingAlgorithm`. Two policies ship: proportional scaling
//! (`HomogeneousRationing`) and seeded random denial (`RandomDenyRationing`).
//!
//! # Modules
//! - `node` — rationing input/output nodes
//! - `rationing` — the algorithm trait and its implementations
//! - `house` — participant registries and the clearing cycle orchestrator

pub mod house;
pub mod node;
pub mod rationing;

pub use house::{Allocation, ClearingHouse, ClearingSummary, MarketInfo, MarketResponse, ResponseSide};
pub use node::Node;
pub use rationing::{HomogeneousRationing, RandomDenyRationing, RationingAlgorithm};
