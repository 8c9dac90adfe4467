//! Exchange core for Bourse
//!
//! [`Exchange::recv`] is the single entry point: it gates every message for
//! duplicate and stale transactions, dispatches on `message_type`, runs the
//! order intake pipeline and the match/settle loop, and answers the market
//! data queries. Every failure becomes an error reply; `recv` never panics
//! on operator input.

pub mod error;
pub mod exchange;
pub mod messages;

pub use error::ExchangeError;
pub use exchange::Exchange;
