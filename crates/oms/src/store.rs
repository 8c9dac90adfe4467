//! The order repository
//!
//! Wraps a versioned [`MemoryStore`] keyed by txid. Mutations go through
//! storage sessions so order closes commit in the same unit of work as the
//! ledger movements they belong to. Book views read committed state only.

use std::sync::Arc;

use storage::{MemoryStore, Session};
use tracing::debug;

use crate::error::{OmsError, OmsResult};
use crate::order::Order;

/// Canonical store of all orders, open and closed
#[derive(Default)]
pub struct OrderStore {
    inner: Arc<MemoryStore<Order>>,
}

impl OrderStore {
    /// Create an empty order store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
        }
    }

    /// Open a staging session for transactional mutation
    pub fn session(&self) -> Session<Order> {
        self.inner.session()
    }

    /// Committed read of one order
    pub fn get(&self, txid: &str) -> Option<Order> {
        self.inner.get(txid)
    }

    /// Stage a new order into the given session
    pub fn add(&self, session: &mut Session<Order>, order: Order) {
        debug!(txid = %order.txid, symbol = %order.symbol, side = %order.side, "staging order");
        session.put(order);
    }

    /// Stage `closed = true` for every txid
    pub fn close(&self, session: &mut Session<Order>, txids: &[String]) -> OmsResult<()> {
        for txid in txids {
            let order = session
                .get_mut(txid)
                .ok_or_else(|| OmsError::UnknownOrder(txid.clone()))?;
            order.closed = true;
        }
        Ok(())
    }

    /// Open buys for a symbol in price-time priority
    ///
    /// Highest rank first (market buys rank `+inf`), ties broken by
    /// ascending `ts`, then lexicographic txid. Orders keep their original
    /// price; only the sort key uses the sentinel.
    pub fn buy_book(&self, symbol: &str) -> Vec<Order> {
        let mut book = self.open_side(symbol, common::Side::Buy);
        book.sort_by(|a, b| {
            b.rank()
                .total_cmp(&a.rank())
                .then_with(|| a.ts.cmp(&b.ts))
                .then_with(|| a.txid.cmp(&b.txid))
        });
        book
    }

    /// Open sells for a symbol in price-time priority
    ///
    /// Lowest rank first (market sells rank `-inf`), same tie-breaks as the
    /// buy book.
    pub fn sell_book(&self, symbol: &str) -> Vec<Order> {
        let mut book = self.open_side(symbol, common::Side::Sell);
        book.sort_by(|a, b| {
            a.rank()
                .total_cmp(&b.rank())
                .then_with(|| a.ts.cmp(&b.ts))
                .then_with(|| a.txid.cmp(&b.txid))
        });
        book
    }

    fn open_side(&self, symbol: &str, side: common::Side) -> Vec<Order> {
        self.inner
            .snapshot()
            .into_iter()
            .filter(|o| !o.closed && o.symbol == symbol && o.side == side)
            .collect()
    }
}
