//! Configuration validation
//!
//! Catches operator mistakes before the exchange starts: duplicate
//! listings, duplicate broker codes, accounts holding unlisted symbols,
//! nonsense prices. Errors block startup; warnings do not.

use std::collections::HashSet;

use crate::MasterConfig;

/// Outcome of validating a configuration
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Problems that must block startup
    pub errors: Vec<String>,
    /// Suspicious but runnable settings
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// True when no blocking problems were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a configuration without starting anything
pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.exchange.name.trim().is_empty() {
        report.errors.push("exchange.name must not be empty".to_string());
    }

    // Kept in step with the formats the observability layer accepts.
    const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];
    if !LOG_FORMATS.contains(&config.logging.format.to_lowercase().as_str()) {
        report.errors.push(format!(
            "logging.format {:?} is not one of {:?}",
            config.logging.format, LOG_FORMATS
        ));
    }

    if config.listings.is_empty() {
        report
            .warnings
            .push("no listings configured; the exchange will accept no orders".to_string());
    }

    let mut symbols = HashSet::new();
    for listing in &config.listings {
        if listing.symbol.trim().is_empty() {
            report.errors.push("listing with empty symbol".to_string());
        }
        if !symbols.insert(listing.symbol.clone()) {
            report
                .errors
                .push(format!("duplicate listing {}", listing.symbol));
        }
        if let Some(price) = listing.reference_price {
            if !price.is_finite() || price <= 0.0 {
                report.errors.push(format!(
                    "listing {} has invalid reference_price {}",
                    listing.symbol, price
                ));
            }
        }
    }

    let mut codes = HashSet::new();
    let mut csids = HashSet::new();
    for broker in &config.brokers {
        if !codes.insert(broker.code.clone()) {
            report
                .errors
                .push(format!("duplicate broker code {}", broker.code));
        }
        for client in &broker.clients {
            if !csids.insert(client.csid.clone()) {
                report
                    .errors
                    .push(format!("duplicate client id {}", client.csid));
            }
            if client.balance < 0.0 {
                report.errors.push(format!(
                    "client {} has negative balance {}",
                    client.csid, client.balance
                ));
            }
            for symbol in client.holdings.keys() {
                if !symbols.contains(symbol) {
                    report.warnings.push(format!(
                        "client {} holds unlisted symbol {}",
                        client.csid, symbol
                    ));
                }
            }
        }
    }

    report
}
