//! Order books and matching for Bourse
//!
//! One [`OrderBook`] per listed symbol holds lightweight entries in strict
//! price-time-txid priority, with best-bid/best-ask tracked in per-side
//! price multisets. [`match_once`] runs one cycle of the matcher: it clears
//! at most one buy against the sells that fill it and proposes a trade at
//! the resolved execution price. The exchange re-invokes it until no trade
//! is produced.
//!
//! CRITICAL PROPERTIES:
//! 1. Deterministic (same inputs → same outputs, always)
//! 2. Pure: `match_once` never mutates the book; the exchange applies the
//!    proposal only after the trade commits
//! 3. Price-time priority (strictly enforced, txid as final tie-break)
//! 4. Per-instrument isolation (books never interact)

pub mod book;
pub mod matcher;
pub mod trade;

pub use book::{BookEntry, BookSummary, OrderBook};
pub use matcher::{match_once, resolve_execution_price, MatchedSell, TradeProposal};
pub use trade::Trade;
