//! The canonical order record
//!
//! Orders are identified by transaction id. A txid is globally unique;
//! residual sells created by splitting carry the parent's txid with a
//! `/N` suffix so the lineage stays visible on the tape.

use common::{OrderPrice, Side};
use serde::{Deserialize, Serialize};
use storage::Record;

use crate::error::{OmsError, OmsResult};

/// An order accepted by the exchange
///
/// `ts` is the exchange-assigned arrival timestamp (unix seconds), not the
/// sender's clock; time priority and execution-price resolution both key off
/// it. A closed order never reopens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Transaction id, globally unique
    pub txid: String,
    /// Client (account) id
    pub csid: String,
    /// Exchange-assigned arrival timestamp, unix seconds
    pub ts: i64,
    /// Buy or sell
    pub side: Side,
    /// Instrument symbol
    pub symbol: String,
    /// Limit price or market
    pub price: OrderPrice,
    /// Remaining volume, always > 0
    pub volume: u64,
    /// Set once the order has fully traded
    pub closed: bool,
}

impl Record for Order {
    fn key(&self) -> String {
        self.txid.clone()
    }
}

impl Order {
    /// Priority rank of this order's price (market orders rank infinite)
    pub fn rank(&self) -> f64 {
        self.price.rank(self.side)
    }

    /// Split a residual sell off this order
    ///
    /// Truncates this sell by `excess` and returns a new open sell for the
    /// remaining volume with the next txid in the lineage (`42` → `42/1`,
    /// `42/3` → `42/4`). Price, client and timestamp carry over unchanged.
    pub fn split_sell(&mut self, excess: u64) -> OmsResult<Order> {
        if self.side != Side::Sell {
            return Err(OmsError::SplitNonSell);
        }
        if excess == 0 || excess >= self.volume {
            return Err(OmsError::SplitVolume {
                excess,
                volume: self.volume,
            });
        }

        self.volume -= excess;

        let remainder = Order {
            txid: next_split_txid(&self.txid),
            volume: excess,
            closed: false,
            ..self.clone()
        };
        Ok(remainder)
    }
}

/// Next txid in a split lineage
fn next_split_txid(txid: &str) -> String {
    match txid.rsplit_once('/') {
        Some((parent, split)) => {
            let next = split.parse::<u64>().map(|n| n + 1).unwrap_or(1);
            format!("{}/{}", parent, next)
        }
        None => format!("{}/1", txid),
    }
}
