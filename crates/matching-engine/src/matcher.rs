//! The price-time priority matcher
//!
//! One invocation clears at most one buy: walking bids best-first, it
//! accumulates asks best-first until the buy's volume is covered, resolves
//! the execution price, and proposes a trade. The exchange executes the
//! proposal and re-invokes until no trade is produced, which bounds the
//! work per accepted order.

use common::{OrderPrice, Side};
use tracing::debug;

use crate::book::{BookEntry, OrderBook};

/// One sell consumed by a proposed trade
#[derive(Debug, Clone)]
pub struct MatchedSell {
    /// Transaction id of the sell
    pub txid: String,
    /// Selling client
    pub csid: String,
    /// The sell's own price (market preserved)
    pub price: OrderPrice,
    /// Volume this trade takes from the sell; less than the sell's open
    /// volume only for the final sell of an over-filled match
    pub matched_volume: u64,
}

/// A trade proposed by the matcher, not yet executed
///
/// Carries everything the exchange needs to close the orders, split the
/// residual sell and settle the ledger in one unit of work.
#[derive(Debug, Clone)]
pub struct TradeProposal {
    /// Instrument symbol
    pub symbol: String,
    /// The cleared buy
    pub buy_txid: String,
    /// Buying client
    pub buy_csid: String,
    /// Trade volume, equal to the buy's volume
    pub volume: u64,
    /// Sell-side volume beyond the buy, to be split back into the book
    pub excess: u64,
    /// Single execution price for the whole trade
    pub execution_price: f64,
    /// Consumed sells in match order
    pub sells: Vec<MatchedSell>,
}

impl TradeProposal {
    /// Transaction ids of the consumed sells, in match order
    pub fn sell_txids(&self) -> Vec<String> {
        self.sells.iter().map(|s| s.txid.clone()).collect()
    }

    /// The final matched sell (the one a residual would split from)
    pub fn last_sell(&self) -> &MatchedSell {
        // a proposal always consumes at least one sell
        &self.sells[self.sells.len() - 1]
    }
}

/// Run one match cycle over the book
///
/// Returns the proposal for the single buy it cleared, or `None` when no
/// cross exists. The book itself is left untouched.
pub fn match_once(book: &OrderBook) -> Option<TradeProposal> {
    let reference = book.reference_price;
    let best_bid = book.best_bid();
    let best_ask = book.best_ask();

    for buy in book.buy_book() {
        let mut accumulated = 0u64;
        let mut matched: Vec<&BookEntry> = Vec::new();

        for sell in book.sell_book() {
            if buy.rank() < sell.rank() {
                // Asks are sorted: this sell is unaffordable, and so is
                // every later one, for this buy and every lower-ranked buy.
                return None;
            }

            accumulated += sell.volume;
            matched.push(sell);

            if accumulated >= buy.volume {
                let excess = accumulated - buy.volume;
                let execution_price =
                    resolve_execution_price(buy, sell, reference, best_bid, best_ask);

                debug!(
                    symbol = book.symbol(),
                    buy_txid = %buy.txid,
                    sells = matched.len(),
                    execution_price,
                    excess,
                    "proposing trade"
                );

                let sells = matched
                    .iter()
                    .map(|s| {
                        let matched_volume = if s.txid == sell.txid {
                            s.volume - excess
                        } else {
                            s.volume
                        };
                        MatchedSell {
                            txid: s.txid.clone(),
                            csid: s.csid.clone(),
                            price: s.price,
                            matched_volume,
                        }
                    })
                    .collect();

                return Some(TradeProposal {
                    symbol: book.symbol().to_string(),
                    buy_txid: buy.txid.clone(),
                    buy_csid: buy.csid.clone(),
                    volume: buy.volume,
                    excess,
                    execution_price,
                    sells,
                });
            }
        }
        // Not enough sell volume for this buy; a smaller buy may still fill.
    }

    None
}

/// Resolve the execution price for a cleared (buy, final sell) pair
///
/// The aggressor is the later-arriving side (an equal-timestamp pair counts
/// as an aggressing sell). A resting limit trades at the touch on its own
/// side; a resting market order trades at the reference price bounded by
/// whatever finite quotes the book holds, in the aggressor's disfavor.
pub fn resolve_execution_price(
    buy: &BookEntry,
    sell: &BookEntry,
    reference: f64,
    best_bid: Option<f64>,
    best_ask: Option<f64>,
) -> f64 {
    let aggressor = if buy.ts > sell.ts { Side::Buy } else { Side::Sell };
    let resting_price = match aggressor {
        Side::Buy => sell.price,
        Side::Sell => buy.price,
    };

    let bid = best_bid.unwrap_or(reference);
    let ask = best_ask.unwrap_or(reference);

    match (resting_price, aggressor) {
        (OrderPrice::Market, Side::Sell) => reference.max(bid).max(ask),
        (OrderPrice::Market, Side::Buy) => reference.min(bid).min(ask),
        (OrderPrice::Limit(_), Side::Sell) => bid,
        (OrderPrice::Limit(_), Side::Buy) => ask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OrderBook;

    struct TestOrder {
        txid: &'static str,
        side: Side,
        price: OrderPrice,
        volume: u64,
        ts: i64,
    }

    fn order(txid: &'static str, side: Side, price: OrderPrice, volume: u64, ts: i64) -> TestOrder {
        TestOrder {
            txid,
            side,
            price,
            volume,
            ts,
        }
    }

    fn book_with(reference: f64, orders: Vec<TestOrder>) -> OrderBook {
        let mut book = OrderBook::new("STI.", reference);
        for seed in orders {
            book.insert(BookEntry {
                txid: seed.txid.to_string(),
                csid: "1".to_string(),
                symbol: "STI.".to_string(),
                side: seed.side,
                price: seed.price,
                volume: seed.volume,
                ts: seed.ts,
            });
        }
        book
    }

    fn assert_proposal(
        proposal: &TradeProposal,
        buy_txid: &str,
        sell_txids: &[&str],
        price: f64,
        excess: u64,
    ) {
        assert_eq!(proposal.buy_txid, buy_txid);
        assert_eq!(proposal.sell_txids(), sell_txids);
        assert_eq!(proposal.execution_price, price);
        assert_eq!(proposal.excess, excess);
    }

    use common::OrderPrice::{Limit, Market};
    use common::Side::{Buy, Sell};

    // The 22-case execution-price grid: every combination of market/limit
    // resting and aggressing orders against reference, best bid and best ask.

    #[test]
    fn test_market_bid_meets_market_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Sell, Market, 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2"], 200.0, 0);
    }

    #[test]
    fn test_limit_bid_meets_equal_limit_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Limit(200.0), 6000, 901),
                order("2", Sell, Limit(200.0), 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2"], 200.0, 0);
    }

    #[test]
    fn test_market_bid_meets_resting_limit_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Limit(200.0), 6000, 901),
                order("2", Buy, Market, 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "2", &["1"], 200.0, 0);
    }

    #[test]
    fn test_market_ask_meets_market_and_limit_bids_under_reference() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Buy, Limit(195.0), 1000, 902),
                order("3", Sell, Market, 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["3"], 200.0, 0);
    }

    #[test]
    fn test_market_ask_meets_market_and_limit_bids_over_reference() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Buy, Limit(202.0), 1000, 902),
                order("3", Sell, Market, 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["3"], 202.0, 0);
    }

    #[test]
    fn test_market_bid_meets_market_and_limit_asks_over_reference() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Sell, Limit(202.0), 1000, 902),
                order("3", Buy, Market, 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "3", &["1"], 200.0, 0);
    }

    #[test]
    fn test_market_bid_meets_market_and_limit_asks_at_reference() {
        let book = book_with(
            202.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Sell, Limit(202.0), 1000, 902),
                order("3", Buy, Market, 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "3", &["1"], 202.0, 0);
    }

    #[test]
    fn test_market_bid_meets_empty_book() {
        let book = book_with(202.0, vec![order("1", Buy, Market, 6000, 1001)]);
        assert!(match_once(&book).is_none());
    }

    #[test]
    fn test_limit_ask_under_reference_meets_resting_market_bid() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Sell, Limit(195.0), 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2"], 200.0, 0);
    }

    #[test]
    fn test_limit_ask_over_reference_meets_resting_market_bid() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Sell, Limit(203.0), 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2"], 203.0, 0);
    }

    #[test]
    fn test_limit_bid_over_reference_meets_resting_market_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Buy, Limit(203.0), 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "2", &["1"], 200.0, 0);
    }

    #[test]
    fn test_limit_bid_under_reference_meets_resting_market_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Buy, Limit(199.0), 6000, 902),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "2", &["1"], 199.0, 0);
    }

    #[test]
    fn test_aggressing_ask_executes_at_best_bid() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Limit(199.0), 6000, 933),
                order("2", Sell, Limit(198.0), 6000, 934),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2"], 199.0, 0);
    }

    #[test]
    fn test_aggressing_bid_executes_at_best_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Limit(199.0), 6000, 933),
                order("2", Buy, Limit(200.0), 6000, 934),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "2", &["1"], 199.0, 0);
    }

    #[test]
    fn test_no_trade_when_bid_under_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Limit(199.0), 6000, 933),
                order("2", Sell, Limit(200.0), 6000, 1001),
            ],
        );
        assert!(match_once(&book).is_none());
    }

    #[test]
    fn test_market_bid_against_cheap_ask_executes_at_reference() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Buy, Limit(196.0), 1000, 902),
                order("3", Sell, Limit(195.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["3"], 200.0, 0);
    }

    #[test]
    fn test_market_bid_against_cheap_ask_executes_at_best_bid() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Buy, Limit(202.0), 1000, 902),
                order("3", Sell, Limit(199.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["3"], 202.0, 0);
    }

    #[test]
    fn test_market_bid_against_rich_ask_executes_at_best_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Buy, Market, 6000, 901),
                order("2", Buy, Limit(202.0), 1000, 902),
                order("3", Sell, Limit(203.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["3"], 203.0, 0);
    }

    #[test]
    fn test_limit_bid_sweeping_market_ask_bounded_by_reference() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Sell, Limit(202.0), 1000, 902),
                order("3", Buy, Limit(203.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "3", &["1"], 200.0, 0);
    }

    #[test]
    fn test_limit_bid_at_reference_sweeping_market_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Sell, Limit(202.0), 1000, 902),
                order("3", Buy, Limit(200.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "3", &["1"], 200.0, 0);
    }

    #[test]
    fn test_limit_bid_sweeping_market_ask_bounded_by_best_ask() {
        let book = book_with(
            200.0,
            vec![
                order("1", Sell, Market, 6000, 901),
                order("2", Sell, Limit(199.0), 1000, 902),
                order("3", Buy, Limit(203.0), 6000, 903),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "3", &["1"], 199.0, 0);
    }

    #[test]
    fn test_limit_bid_meets_empty_book() {
        let book = book_with(200.0, vec![order("1", Buy, Limit(200.0), 6000, 1001)]);
        assert!(match_once(&book).is_none());
    }

    // Aggregation and partial-fill behavior beyond the price grid

    #[test]
    fn test_multi_sell_aggregation_with_excess() {
        let book = book_with(
            1.0,
            vec![
                order("2", Sell, Limit(0.50), 500, 1),
                order("3", Sell, Limit(1.00), 250, 1),
                order("4", Sell, Limit(1.00), 300, 1),
                order("1", Buy, Limit(1.00), 1000, 2),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_proposal(&p, "1", &["2", "3", "4"], 0.5, 50);
        assert_eq!(p.volume, 1000);
        assert_eq!(p.sells[0].matched_volume, 500);
        assert_eq!(p.sells[1].matched_volume, 250);
        assert_eq!(p.sells[2].matched_volume, 250);
    }

    #[test]
    fn test_underfilled_buy_does_not_block_smaller_buy() {
        // The big buy cannot fill; the smaller, lower-priority buy can.
        let book = book_with(
            1.0,
            vec![
                order("big", Buy, Limit(1.10), 1000, 1),
                order("small", Buy, Limit(1.05), 100, 2),
                order("s", Sell, Limit(1.00), 100, 3),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_eq!(p.buy_txid, "small");
        assert_eq!(p.sell_txids(), vec!["s"]);
    }

    #[test]
    fn test_one_buy_cleared_per_invocation() {
        let book = book_with(
            1.0,
            vec![
                order("b1", Buy, Limit(1.00), 100, 1),
                order("b2", Buy, Limit(1.00), 100, 2),
                order("s1", Sell, Limit(1.00), 100, 3),
                order("s2", Sell, Limit(1.00), 100, 4),
            ],
        );
        let p = match_once(&book).unwrap();
        assert_eq!(p.buy_txid, "b1");
        assert_eq!(p.sell_txids(), vec!["s1"]);
    }
}
