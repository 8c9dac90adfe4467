//! Settled trades
//!
//! A [`Trade`] is the committed outcome of a [`TradeProposal`]: one buy
//! closed against one or more sells at a single execution price. Trades are
//! immutable once closed and feed the per-instrument tape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matcher::TradeProposal;

/// The settled outcome of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Trade id
    pub tid: String,
    /// Execution timestamp, unix seconds
    pub ts: i64,
    /// Instrument symbol
    pub symbol: String,
    /// The cleared buy
    pub buy_txid: String,
    /// Consumed sells in match order
    pub sell_txids: Vec<String>,
    /// Per-unit execution price
    pub avg_price: f64,
    /// `avg_price * volume`
    pub total_price: f64,
    /// Traded volume, equal to the buy's volume
    pub volume: u64,
    /// Sell-side volume split back into the book
    pub excess: u64,
    /// Set once the orders are closed and the ledger settled
    pub closed: bool,
}

impl Trade {
    /// Build the trade record for a proposal
    ///
    /// The whole trade executes at the resolved price, so
    /// `total_price = execution_price * volume` and `avg_price` is the
    /// execution price itself.
    pub fn from_proposal(proposal: &TradeProposal, ts: i64) -> Self {
        let total_price = proposal.execution_price * proposal.volume as f64;
        Self {
            tid: Uuid::new_v4().to_string(),
            ts,
            symbol: proposal.symbol.clone(),
            buy_txid: proposal.buy_txid.clone(),
            sell_txids: proposal.sell_txids(),
            avg_price: proposal.execution_price,
            total_price,
            volume: proposal.volume,
            excess: proposal.excess,
            closed: false,
        }
    }
}
