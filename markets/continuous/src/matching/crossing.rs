//! Crossing detection
//!
//! A bid and an ask can match when the bid price is at least the ask price.

use types::numeric::Price;

/// Check if a bid and ask can match at given prices.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}
