//! Simulation driver
//!
//! Wires the market core into runnable simulations: a phase-ordered event
//! scheduler, a settlement collaborator that moves actual cash and shares,
//! an explicit per-simulation context and a handful of demo agent
//! strategies.
//!
//! # Modules
//! - `scheduler` — integer time keys and the three-phase cycle contract
//! - `settlement` — trade settlement and the loan contract book
//! - `context` — explicit shared state for one simulation
//! - `bots` — seeded demo strategies
//! - `engine` — drives everything through the scheduler

pub mod bots;
pub mod context;
pub mod engine;
pub mod scheduler;
pub mod settlement;

pub use bots::{Bot, BorrowerBot, LenderBot, NoiseTrader};
pub use context::SimulationContext;
pub use engine::SimEngine;
pub use scheduler::{Phase, Scheduler, TimeKey};
pub use settlement::{LoanContract, SettlementAgent};
