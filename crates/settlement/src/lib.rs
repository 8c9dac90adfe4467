//! Settlement for Bourse
//!
//! This crate owns client money: cash balances, per-symbol holdings, the
//! pre-trade screen, the reservation taken when an order is accepted, and
//! the transfer of ownership when a trade settles. All mutations are staged
//! on storage sessions so they commit in the same unit of work as the order
//! bookkeeping they belong to.

pub mod broker;
pub mod client;
pub mod error;
pub mod ledger;

pub use broker::Broker;
pub use client::Client;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Ledger, TradeSettlement};
