//! Types library for the agent-economy market core
//!
//! This library provides all core type definitions shared across the market
//! crates: identifiers, fixed-point numerics, parties and their role
//! capabilities, orders, trades, the per-party allocation ledger, and the
//! error taxonomy.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, PartyId, ContractId, InstrumentId)
//! - `numeric`: Fixed-point decimal types (Price, Volume)
//! - `party`: Parties, role capabilities, and the party registry
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `ledger`: Allocation ledger (reserved vs. free resources)
//! - `errors`: Error taxonomy

pub mod errors;
pub mod ids;
pub mod ledger;
pub mod numeric;
pub mod order;
pub mod party;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::ledger::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::party::*;
    pub use crate::trade::*;
}
