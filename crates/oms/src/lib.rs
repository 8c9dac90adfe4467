//! Order Management for Bourse
//!
//! This crate owns the canonical [`Order`] record and the [`OrderStore`]
//! repository. Every order the exchange accepts is persisted here, keyed by
//! transaction id; the store also serves the price-time-priority book views
//! used by queries and by reconciliation.

pub mod error;
pub mod order;
pub mod store;

pub use error::{OmsError, OmsResult};
pub use order::Order;
pub use store::OrderStore;
