//! The client ledger
//!
//! Screening answers "can this order ever settle" against committed state.
//! Reserving debits the cost of an accepted order (cash for buys, shares
//! for sells) before matching runs, so an in-flight order cannot be
//! double-spent by a concurrent message from the same client. Settling
//! transfers ownership when a trade commits: the buyer receives the traded
//! volume and any unspent part of the reservation back, the sellers receive
//! the trade's cash.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use common::Side;
use oms::Order;
use storage::{MemoryStore, Session};
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{LedgerError, LedgerResult};

/// Cash and share movements for one committed trade
#[derive(Debug, Clone)]
pub struct TradeSettlement {
    /// Instrument symbol
    pub symbol: String,
    /// Txid of the cleared buy (keys the cash reservation)
    pub buy_txid: String,
    /// Buying client
    pub buyer: String,
    /// Volume credited to the buyer
    pub volume: u64,
    /// Cash the buyer ultimately pays for this trade
    pub total_price: f64,
    /// Cash credited to each selling client, in match order
    pub seller_credits: Vec<(String, f64)>,
}

/// Per-client cash and holdings, plus the outstanding order reservations
#[derive(Default)]
pub struct Ledger {
    clients: Arc<MemoryStore<Client>>,
    // Cash held per open buy txid; consumed when the buy's trade settles
    reserved_cash: Mutex<HashMap<String, f64>>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            clients: Arc::new(MemoryStore::new()),
            reserved_cash: Mutex::new(HashMap::new()),
        }
    }

    /// Open a staging session over the client store
    pub fn session(&self) -> Session<Client> {
        self.clients.session()
    }

    /// Committed read of one client
    pub fn get(&self, csid: &str) -> Option<Client> {
        self.clients.get(csid)
    }

    /// Register clients outside any order flow (broker onboarding)
    pub fn register(&self, clients: Vec<Client>) -> LedgerResult<()> {
        let mut session = self.session();
        for client in clients {
            info!(csid = %client.csid, name = %client.name, "registering client");
            session.put(client);
        }
        session.commit()?;
        Ok(())
    }

    /// Pre-trade screen against committed balances
    ///
    /// A buy must be affordable at its limit price (or the reference price
    /// for market orders); a sell must be covered by the client's holding.
    pub fn screen(&self, order: &Order, reference_price: f64) -> LedgerResult<()> {
        let client = self
            .get(&order.csid)
            .ok_or_else(|| LedgerError::UnknownClient(order.csid.clone()))?;

        match order.side {
            Side::Buy => {
                let cost = order.price.effective(reference_price) * order.volume as f64;
                if cost > client.balance {
                    return Err(LedgerError::InsufficientBalance);
                }
            }
            Side::Sell => {
                if client.holding(&order.symbol) < order.volume {
                    return Err(LedgerError::InsufficientHolding);
                }
            }
        }
        Ok(())
    }

    /// Reserve the cost of accepted orders before matching
    ///
    /// Buys stage a cash debit at the effective price and return the amounts
    /// reserved per txid; sells stage a share debit. The caller records the
    /// returned reservations with [`Ledger::note_reservations`] once the
    /// unit of work has applied.
    pub fn reserve(
        &self,
        session: &mut Session<Client>,
        buys: &[Order],
        sells: &[Order],
        reference_price: f64,
    ) -> LedgerResult<Vec<(String, f64)>> {
        let mut reservations = Vec::new();

        for order in buys {
            let amount = order.price.effective(reference_price) * order.volume as f64;
            self.adjust_balance(session, &order.csid, -amount)?;
            reservations.push((order.txid.clone(), amount));
        }
        for order in sells {
            self.adjust_holding(session, &order.csid, &order.symbol, -(order.volume as i64))?;
        }

        Ok(reservations)
    }

    /// Record applied cash reservations
    pub fn note_reservations(&self, reservations: Vec<(String, f64)>) {
        let mut reserved = self.reserved_cash.lock();
        for (txid, amount) in reservations {
            reserved.insert(txid, amount);
        }
    }

    /// Cash currently held for an open buy
    pub fn reserved_for(&self, txid: &str) -> f64 {
        self.reserved_cash.lock().get(txid).copied().unwrap_or(0.0)
    }

    /// Drop the reservation once its buy has settled
    pub fn consume_reservation(&self, txid: &str) -> f64 {
        self.reserved_cash.lock().remove(txid).unwrap_or(0.0)
    }

    /// Stage the ownership transfer for one trade
    ///
    /// The buyer receives the traded volume and the unspent remainder of the
    /// reservation (negative when the execution price exceeded it); each
    /// seller receives their share of the trade's cash. The sum of seller
    /// credits equals the buyer's net debit.
    pub fn settle(
        &self,
        session: &mut Session<Client>,
        settlement: &TradeSettlement,
    ) -> LedgerResult<()> {
        let refund = self.reserved_for(&settlement.buy_txid) - settlement.total_price;

        self.adjust_holding(
            session,
            &settlement.buyer,
            &settlement.symbol,
            settlement.volume as i64,
        )?;
        self.adjust_balance(session, &settlement.buyer, refund)?;

        for (csid, credit) in &settlement.seller_credits {
            self.adjust_balance(session, csid, *credit)?;
        }

        Ok(())
    }

    /// Stage a cash movement for one client
    pub fn adjust_balance(
        &self,
        session: &mut Session<Client>,
        csid: &str,
        delta: f64,
    ) -> LedgerResult<()> {
        let client = session
            .get_mut(csid)
            .ok_or_else(|| LedgerError::UnknownClient(csid.to_string()))?;
        client.adjust_balance(delta)?;
        debug!(csid, balance = client.balance, "cash adjusted");
        Ok(())
    }

    /// Stage a share movement for one client
    pub fn adjust_holding(
        &self,
        session: &mut Session<Client>,
        csid: &str,
        symbol: &str,
        delta: i64,
    ) -> LedgerResult<()> {
        let client = session
            .get_mut(csid)
            .ok_or_else(|| LedgerError::UnknownClient(csid.to_string()))?;
        client.adjust_holding(symbol, delta)?;
        debug!(csid, symbol, held = client.holding(symbol), "holding adjusted");
        Ok(())
    }
}
