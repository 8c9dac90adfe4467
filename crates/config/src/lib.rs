//! Master configuration for Bourse
//!
//! A single YAML file describes the exchange: metadata, the listener
//! binding, the listed instruments and the brokers with their seeded client
//! accounts. `${VAR}` / `${VAR:-default}` references are substituted from
//! the environment before parsing, and [`validate_config`] produces a
//! report of errors and warnings without starting anything.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod defaults;
pub mod error;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::generate_default_config;
pub use error::ConfigError;
pub use parser::{load_config, save_config};
pub use substitution::substitute_env;
pub use validator::{validate_config, ValidationReport};

/// The whole configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Exchange metadata
    pub exchange: ExchangeSection,
    /// Listener binding
    #[serde(default)]
    pub server: ServerSection,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSection,
    /// Instruments listed at startup
    #[serde(default)]
    pub listings: Vec<ListingConfig>,
    /// Brokers registered at startup
    #[serde(default)]
    pub brokers: Vec<BrokerConfig>,
}

/// Exchange metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSection {
    /// Exchange display name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Config schema version
    pub version: String,
}

/// Listener binding, overridable by `EXCHANGE_HOST`/`EXCHANGE_PORT`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Host to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7654
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log output, consumed by the observability layer at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Output format: `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Filter directive when `RUST_LOG` is unset, e.g. `info` or
    /// `exchange=debug,info`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

/// One instrument listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Ticker symbol
    pub symbol: String,
    /// Company name
    pub name: String,
    /// Reference price seed; defaults to 1.0 when absent
    #[serde(default)]
    pub reference_price: Option<f64>,
}

/// One broker and its seeded accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker code
    pub code: String,
    /// Display name
    pub name: String,
    /// Client accounts opened at startup
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

/// One seeded client account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client id
    pub csid: String,
    /// Display name
    pub name: String,
    /// Opening cash balance
    #[serde(default)]
    pub balance: f64,
    /// Opening holdings, symbol → volume
    #[serde(default)]
    pub holdings: HashMap<String, u64>,
}
