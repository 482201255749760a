//! Order book infrastructure
//!
//! Price levels and the per-instrument bid/ask queues.

pub mod instrument_book;
pub mod price_level;

pub use instrument_book::InstrumentBook;
pub use price_level::{LevelEntry, PriceLevel};
