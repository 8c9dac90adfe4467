//! Instruments and market summaries for Bourse
//!
//! Stock metadata is an ordinary repository; each listed symbol also gets a
//! [`MarketStall`] recording the running tape: last, min and max price,
//! trade and volume counters, and the trade history.

pub mod stall;
pub mod stock;

pub use stall::MarketStall;
pub use stock::{Stock, StockStore};
