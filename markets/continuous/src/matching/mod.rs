//! Matching logic
//!
//! The uncross loop repeatedly crosses the best bid against the best ask
//! while their prices overlap, trading `min(open)` at the resting order's
//! price. A pair blocked by a counterparty filter (or a self-cross) halts
//! the whole pass: time priority forbids trading past the front of a
//! queue, so eligible orders behind the blocked entry wait until the book
//! changes. Matches already computed stay final.

pub mod crossing;
pub mod executor;

pub use executor::TradeExecutor;

use crate::book::InstrumentBook;
use tracing::debug;
use types::numeric::Price;
use types::party::Parties;
use types::trade::Trade;

/// One match produced by the uncross loop, with the buyer's limit price so
/// the venue can release the exact cash reservation backing the fill.
#[derive(Debug, Clone)]
pub struct Fill {
    pub trade: Trade,
    pub buyer_limit: Price,
    pub buyer_filled: bool,
    pub seller_filled: bool,
}

/// Cross resting orders until best bid < best ask.
///
/// The trade price is the price of whichever order was resting first
/// (lower submission sequence) — price-time priority, the aggressor pays
/// the resting order's price.
pub fn uncross(
    book: &mut InstrumentBook,
    parties: &Parties,
    executor: &mut TradeExecutor,
    cycle: u64,
) -> Vec<Fill> {
    use types::order::Side;

    let mut fills = Vec::new();

    while let (Some(bid_price), Some(ask_price)) = (book.best_bid(), book.best_ask()) {
        if !crossing::can_match(bid_price, ask_price) {
            break;
        }

        let bid = book
            .front(Side::Buy, bid_price)
            .expect("best bid level must be non-empty")
            .clone();
        let ask = book
            .front(Side::Sell, ask_price)
            .expect("best ask level must be non-empty")
            .clone();

        // A party never trades with itself.
        if bid.party_id == ask.party_id {
            break;
        }

        let buyer_roles = parties
            .get(&bid.party_id)
            .map(|p| p.roles())
            .unwrap_or_default();
        let seller_roles = parties
            .get(&ask.party_id)
            .map(|p| p.roles())
            .unwrap_or_default();
        if !bid.filter.admits(ask.party_id, &seller_roles)
            || !ask.filter.admits(bid.party_id, &buyer_roles)
        {
            break;
        }

        // Resting order's price: the earlier submission wins.
        let price = if bid.seq < ask.seq { bid_price } else { ask_price };
        let volume = bid.open.min(ask.open);

        let trade = executor.execute(
            book.instrument().clone(),
            bid.order_id,
            ask.order_id,
            bid.party_id,
            ask.party_id,
            price,
            volume,
            cycle,
        );
        debug!(
            instrument = %trade.instrument,
            price = %trade.price,
            volume = %trade.volume,
            "crossed orders"
        );

        let (_, buyer_filled) = book.fill_front(Side::Buy, bid_price, volume);
        let (_, seller_filled) = book.fill_front(Side::Sell, ask_price, volume);

        fills.push(Fill {
            trade,
            buyer_limit: bid_price,
            buyer_filled,
            seller_filled,
        });
    }

    fills
}
