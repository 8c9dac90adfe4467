//! Default configuration
//!
//! The generated file lists a small demo market with one funded broker, the
//! same shape an operator would fill in for a real deployment.

use std::collections::HashMap;

use crate::{
    BrokerConfig, ClientConfig, ExchangeSection, ListingConfig, LoggingSection, MasterConfig,
    ServerSection,
};

/// A runnable starter configuration
pub fn generate_default_config() -> MasterConfig {
    MasterConfig {
        exchange: ExchangeSection {
            name: "Bourse".to_string(),
            description: "An electronic stock exchange".to_string(),
            version: "0.1.0".to_string(),
        },
        server: ServerSection::default(),
        logging: LoggingSection::default(),
        listings: vec![
            ListingConfig {
                symbol: "STI.".to_string(),
                name: "Sam and Tom Industrys".to_string(),
                reference_price: None,
            },
            ListingConfig {
                symbol: "ARRM".to_string(),
                name: "AbeRystwyth RISC Machines".to_string(),
                reference_price: None,
            },
            ListingConfig {
                symbol: "ELAN".to_string(),
                name: "Elan Dataworks".to_string(),
                reference_price: None,
            },
        ],
        brokers: vec![BrokerConfig {
            code: "MAGENTA".to_string(),
            name: "Magenta Holdings Plc.".to_string(),
            clients: vec![ClientConfig {
                csid: "1".to_string(),
                name: "Sam".to_string(),
                balance: 100_000.0,
                holdings: HashMap::from([
                    ("STI.".to_string(), 10_000),
                    ("ELAN".to_string(), 10_000),
                ]),
            }],
        }],
    }
}
