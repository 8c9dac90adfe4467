//! Listed stocks
//!
//! Immutable after listing; the symbol is the primary key.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{MemoryStore, Record};
use tracing::info;

/// A listed instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    /// Ticker symbol, primary key
    pub symbol: String,
    /// Company name
    pub name: String,
}

impl Record for Stock {
    fn key(&self) -> String {
        self.symbol.clone()
    }
}

impl Stock {
    /// Create a listing record
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Registry of listed stocks
#[derive(Default)]
pub struct StockStore {
    inner: Arc<MemoryStore<Stock>>,
}

impl StockStore {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
        }
    }

    /// List a stock
    pub fn add(&self, stock: Stock) -> storage::Result<()> {
        info!(symbol = %stock.symbol, name = %stock.name, "listed");
        let mut session = self.inner.session();
        session.put(stock);
        session.commit()
    }

    /// Look up a listing by symbol
    pub fn get(&self, symbol: &str) -> Option<Stock> {
        self.inner.get(symbol)
    }

    /// All listed symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols = self.inner.keys();
        symbols.sort();
        symbols
    }
}
