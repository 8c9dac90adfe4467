//! Per-symbol market summary
//!
//! A stall tracks the instrument's running tape. Its `last_price` doubles
//! as the reference price for execution-price resolution, seeded at listing
//! (default 1.0) before any trade has printed.

use matching_engine::Trade;
use serde::Serialize;
use tracing::info;

use crate::stock::Stock;

/// Default reference price for a listing with no trade history
pub const DEFAULT_REFERENCE_PRICE: f64 = 1.0;

/// The running market summary for one instrument
#[derive(Debug, Clone, Serialize)]
pub struct MarketStall {
    /// The listed stock
    pub stock: Stock,
    /// Last executed price; the instrument's reference price
    pub last_price: f64,
    /// Lowest print so far
    pub min_price: Option<f64>,
    /// Highest print so far
    pub max_price: Option<f64>,
    /// Number of trades printed
    pub n_trades: u64,
    /// Total volume traded
    pub v_trades: u64,
    /// Every committed trade, oldest first
    pub trade_history: Vec<Trade>,
}

impl MarketStall {
    /// Open a stall seeded with the default reference price
    pub fn new(stock: Stock) -> Self {
        Self::with_reference_price(stock, DEFAULT_REFERENCE_PRICE)
    }

    /// Open a stall with a listing-supplied reference price
    pub fn with_reference_price(stock: Stock, reference_price: f64) -> Self {
        Self {
            stock,
            last_price: reference_price,
            min_price: None,
            max_price: None,
            n_trades: 0,
            v_trades: 0,
            trade_history: Vec::new(),
        }
    }

    /// Record a committed trade on the tape
    pub fn record_trade(&mut self, trade: Trade) {
        self.last_price = trade.avg_price;
        self.min_price = Some(self.min_price.map_or(trade.avg_price, |p| p.min(trade.avg_price)));
        self.max_price = Some(self.max_price.map_or(trade.avg_price, |p| p.max(trade.avg_price)));
        self.n_trades += 1;
        self.v_trades += trade.volume;

        info!(
            symbol = %self.stock.symbol,
            price = self.last_price,
            volume = trade.volume,
            n_trades = self.n_trades,
            v_trades = self.v_trades,
            "trade printed"
        );

        self.trade_history.push(trade);
    }

    /// The most recent print, if any
    pub fn last_trade(&self) -> Option<&Trade> {
        self.trade_history.last()
    }
}
