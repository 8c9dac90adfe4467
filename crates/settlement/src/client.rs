//! Client accounts
//!
//! A client holds cash and per-symbol share volumes. The adjust primitives
//! refuse to go negative: screening is the first line of defense, this is
//! the invariant check at the ledger itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storage::Record;

use crate::error::{LedgerError, LedgerResult};

// Float dust from repeated balance arithmetic must not read as insolvency.
const CASH_EPSILON: f64 = 1e-9;

/// A broker client with cash and holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Client id
    pub csid: String,
    /// Display name
    pub name: String,
    /// Cash balance, never negative
    pub balance: f64,
    /// Symbol → held volume, never negative
    pub holdings: HashMap<String, u64>,
}

impl Record for Client {
    fn key(&self) -> String {
        self.csid.clone()
    }
}

impl Client {
    /// Create a client with no cash and no holdings
    pub fn new(csid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            csid: csid.into(),
            name: name.into(),
            balance: 0.0,
            holdings: HashMap::new(),
        }
    }

    /// Held volume for a symbol (0 when never held)
    pub fn holding(&self, symbol: &str) -> u64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Move cash in or out
    pub fn adjust_balance(&mut self, delta: f64) -> LedgerResult<()> {
        let next = self.balance + delta;
        if next < -CASH_EPSILON {
            return Err(LedgerError::NegativeBalance(self.csid.clone()));
        }
        self.balance = next.max(0.0);
        Ok(())
    }

    /// Move shares in or out
    pub fn adjust_holding(&mut self, symbol: &str, delta: i64) -> LedgerResult<()> {
        let held = self.holding(symbol) as i64;
        let next = held + delta;
        if next < 0 {
            return Err(LedgerError::NegativeHolding {
                csid: self.csid.clone(),
                symbol: symbol.to_string(),
            });
        }
        self.holdings.insert(symbol.to_string(), next as u64);
        Ok(())
    }
}
