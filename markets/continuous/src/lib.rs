//! Continuous double-auction market
//!
//! One `Market` (venue) owns a set of instruments, each with a bid/ask book.
//! Submission order: validate, reserve resources in the allocation ledger,
//! insert, uncross. Matching crosses the best bid against the best ask at
//! the resting order's price until prices no longer overlap.
//!
//! # Modules
//! - `book` — price levels and per-instrument bid/ask queues
//! - `matching` — crossing rule, uncross loop, trade executor
//! - `venue` — the `Market` venue with role eligibility and ledger discipline

pub mod book;
pub mod matching;
pub mod venue;

pub use book::{InstrumentBook, LevelEntry, PriceLevel};
pub use matching::{Fill, TradeExecutor};
pub use venue::{Market, MatchOutcome, ReservationPolicy};
