//! Broker accounts
//!
//! A broker fronts a set of client accounts. Clients themselves live in the
//! exchange's single [`Ledger`]; the broker record answers "does this
//! account belong to this broker" so an order arriving under the wrong
//! broker id is rejected before it touches money.

use parking_lot::RwLock;
use std::collections::HashSet;

use oms::Order;
use tracing::info;

use crate::client::Client;
use crate::error::LedgerResult;
use crate::ledger::Ledger;

/// A registered broker
pub struct Broker {
    /// Broker code, e.g. `MAGENTA`
    pub code: String,
    /// Display name
    pub name: String,
    accounts: RwLock<HashSet<String>>,
}

impl Broker {
    /// Register a broker with no accounts
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let broker = Self {
            code: code.into(),
            name: name.into(),
            accounts: RwLock::new(HashSet::new()),
        };
        info!(code = %broker.code, name = %broker.name, "broker registered");
        broker
    }

    /// Onboard clients: record membership and create their ledger accounts
    pub fn add_clients(&self, ledger: &Ledger, clients: Vec<Client>) -> LedgerResult<()> {
        {
            let mut accounts = self.accounts.write();
            for client in &clients {
                accounts.insert(client.csid.clone());
            }
        }
        ledger.register(clients)
    }

    /// True if the account was onboarded through this broker
    pub fn knows(&self, csid: &str) -> bool {
        self.accounts.read().contains(csid)
    }

    /// Resolve one of this broker's accounts to its ledger client
    pub fn get_user(&self, ledger: &Ledger, csid: &str) -> Option<Client> {
        if !self.knows(csid) {
            return None;
        }
        ledger.get(csid)
    }

    /// Pre-order screen for one of this broker's clients
    pub fn validate_preorder(
        &self,
        ledger: &Ledger,
        order: &Order,
        reference_price: f64,
    ) -> LedgerResult<()> {
        ledger.screen(order, reference_price)
    }
}
