//! Bourse exchange binary
//!
//! Entry point for the exchange: `init` writes a starter configuration,
//! `validate` checks one without starting anything, and `start` builds the
//! exchange from the configuration and serves the line-oriented TCP
//! protocol until Ctrl+C.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig};
use exchange::Exchange;
use instrument::Stock;
use observability::{init_logging, LoggingOptions};
use server::{validate_port_available, ExchangeServer, ServerConfig};
use settlement::{Broker, Client};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config, host, port } => start_command(config, host, port).await,
        Commands::Validate { config } => validate_command(config).await,
        Commands::Init { output } => init_command(output),
    }
}

async fn start_command<P: AsRef<Path>>(
    config_path: P,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    let config = load_config(&config_path)
        .with_context(|| format!("loading {:?}", config_path.as_ref()))?;

    let logging = LoggingOptions::from_config("bourse", &config.logging.format, &config.logging.level)?;
    init_logging(&logging)?;

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    if !report.is_valid() {
        for err in &report.errors {
            tracing::error!("{}", err);
        }
        anyhow::bail!("cannot start exchange due to configuration errors");
    }

    let exchange = Arc::new(build_exchange(&config)?);

    let mut server_config =
        ServerConfig::new(config.server.host.clone(), config.server.port).with_env_overrides();
    if let Some(host) = host_override {
        server_config.host = host;
    }
    if let Some(port) = port_override {
        server_config.port = port;
    }

    info!(
        exchange = %config.exchange.name,
        addr = %server_config.bind_addr(),
        listings = config.listings.len(),
        brokers = config.brokers.len(),
        "starting exchange"
    );

    let server = ExchangeServer::new(server_config, exchange);
    server.run_with_ctrl_c().await?;

    Ok(())
}

/// Build and seed an exchange from configuration
fn build_exchange(config: &MasterConfig) -> Result<Exchange> {
    let exchange = Exchange::new();

    for listing in &config.listings {
        let stock = Stock::new(&listing.symbol, &listing.name);
        match listing.reference_price {
            Some(price) => exchange
                .add_stock_with_reference(stock, price)
                .map_err(|e| anyhow::anyhow!("listing {}: {}", listing.symbol, e))?,
            None => exchange
                .add_stock(stock)
                .map_err(|e| anyhow::anyhow!("listing {}: {}", listing.symbol, e))?,
        }
    }

    for broker_config in &config.brokers {
        let broker = Broker::new(&broker_config.code, &broker_config.name);
        let clients = broker_config
            .clients
            .iter()
            .map(|c| Client {
                csid: c.csid.clone(),
                name: c.name.clone(),
                balance: c.balance,
                holdings: c.holdings.iter().map(|(s, v)| (s.clone(), *v)).collect::<HashMap<_, _>>(),
            })
            .collect();
        broker
            .add_clients(exchange.ledger(), clients)
            .map_err(|e| anyhow::anyhow!("broker {}: {}", broker_config.code, e))?;
        exchange.add_broker(broker);
    }

    Ok(exchange)
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(&config_path)
        .with_context(|| format!("loading {:?}", config_path.as_ref()))?;

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] {}", warning);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("configuration validation failed");
    }

    // Advisory: the exchange may legitimately hold the port already.
    let server_config =
        ServerConfig::new(config.server.host.clone(), config.server.port).with_env_overrides();
    match validate_port_available(&server_config).await {
        Ok(()) => println!("Listener: {} is available", server_config.bind_addr()),
        Err(e) => println!("  [warn] listener: {}", e),
    }
    println!();

    println!("[ok] Configuration is valid!");
    println!();
    println!("Exchange: {}", config.exchange.name);
    println!("Version: {}", config.exchange.version);
    println!("Listings: {}", config.listings.len());
    println!("Brokers: {}", config.brokers.len());

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {:?}", parent))?;
        }
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created at {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the file to list your instruments and brokers");
    println!("  2. Run 'bourse validate --config {:?}'", output_path);
    println!("  3. Run 'bourse start --config {:?}'", output_path);

    Ok(())
}
