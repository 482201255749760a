//! Error taxonomy for the market core
//!
//! Business-rule rejections (bad order, failed reservation) are typed
//! `Result` values handled at the call site; they never abort a simulation
//! cycle. Ledger and conservation invariant violations are programming
//! errors and panic instead of appearing here.

use thiserror::Error;

/// Top-level market error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),
}

/// Order violates market structural rules. The rejected order never enters
/// a queue and no partial state is created.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Order size must be positive, got {size}")]
    NonPositiveSize { size: String },

    #[error("Order price must be positive, got {price}")]
    NonPositivePrice { price: String },

    #[error("Party {party} lacks the {required} role to {side} on this market")]
    RoleNotPermitted {
        party: String,
        side: String,
        required: String,
    },

    #[error("Unknown instrument: {instrument}")]
    UnknownInstrument { instrument: String },

    #[error("Unknown party: {party}")]
    UnknownParty { party: String },
}

/// Requested resource reservation exceeds the unallocated amount.
///
/// Shares are all-or-nothing: the reservation fails and the ledger is left
/// unchanged. The cash ledger itself caps silently and never produces this
/// error; `InsufficientCash` is raised by the venue when a capped
/// reservation came back short of what the order needs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("Insufficient cash: required {required}, reserved {reserved}")]
    InsufficientCash { required: String, reserved: String },

    #[error("Insufficient shares of {instrument}: requested {requested}, unallocated {unallocated}")]
    InsufficientShares {
        instrument: String,
        requested: String,
        unallocated: String,
    },

    #[error("Releasing {requested} shares of {instrument} exceeds allocated {allocated}")]
    ExcessShareRelease {
        instrument: String,
        requested: String,
        allocated: String,
    },

    #[error("No share ledger for instrument {instrument}")]
    UnknownShareClass { instrument: String },
}

/// Malformed rationing input. Indicates a caller bug upstream of the core,
/// not a market condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgorithmError {
    #[error("Invalid algorithm parameter: negative price {price}")]
    NegativePrice { price: String },

    #[error("Invalid algorithm parameter: negative volume {volume}")]
    NegativeVolume { volume: String },
}

/// Raised by the settlement collaborator when actual cash or share movement
/// fails. Distinct from `AllocationError`: allocation failures happen at
/// order-submission time against reserved capacity; a settlement failure
/// after a successful reservation reflects broken accounting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("Settlement insufficient funds for {party}: required {required}, available {available}")]
    InsufficientFunds {
        party: String,
        required: String,
        available: String,
    },

    #[error("Settlement insufficient shares of {instrument} for {party}")]
    InsufficientShares { party: String, instrument: String },

    #[error("Unknown party at settlement: {party}")]
    UnknownParty { party: String },

    #[error("Unknown contract at settlement: {contract}")]
    UnknownContract { contract: String },
}
