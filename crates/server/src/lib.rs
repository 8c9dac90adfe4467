//! Server infrastructure for Bourse
//!
//! The exchange speaks a line-oriented TCP protocol: each request is a
//! single JSON object on one line, and the reply is a JSON object on one
//! line over the same connection. This crate provides the listener, the
//! per-connection loop and graceful shutdown coordination via
//! `CancellationToken` (cancelling a parent token cancels every
//! connection's child token).

pub mod config;
pub mod error;
pub mod port_check;
pub mod shutdown;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use port_check::validate_port_available;
pub use shutdown::{shutdown_signal, ShutdownController};

use std::sync::Arc;

use exchange::Exchange;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The exchange's TCP front end
pub struct ExchangeServer {
    config: ServerConfig,
    exchange: Arc<Exchange>,
}

impl ExchangeServer {
    /// Create a server for an exchange instance
    pub fn new(config: ServerConfig, exchange: Arc<Exchange>) -> Self {
        Self { config, exchange }
    }

    /// The configured bind address
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listener
    ///
    /// Split from [`ExchangeServer::serve`] so callers (and tests) can bind
    /// port 0 and read back the assigned address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind { addr, source: e })?;
        info!(addr = %listener.local_addr()?, "exchange listening");
        Ok(listener)
    }

    /// Accept connections until the token is cancelled
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown signal received");
                    break;
                }
                accepted = listener.accept() => {
                    let (socket, peer) = accepted?;
                    debug!(%peer, "connection accepted");
                    let exchange = Arc::clone(&self.exchange);
                    let token = shutdown.child_token();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, exchange, token).await {
                            warn!(%peer, %e, "connection closed with error");
                        }
                    });
                }
            }
        }
        info!("exchange server shut down");
        Ok(())
    }

    /// Check the port, bind and serve until the token is cancelled
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        validate_port_available(&self.config).await?;
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Bind and serve until Ctrl+C
    pub async fn run_with_ctrl_c(&self) -> Result<()> {
        self.run(shutdown_signal()).await
    }
}

/// One connection: read a JSON line, answer with a JSON line
async fn handle_connection(
    socket: TcpStream,
    exchange: Arc<Exchange>,
    token: CancellationToken,
) -> Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let reply = match serde_json::from_str::<Value>(&line) {
                    Ok(msg) => exchange.recv(&msg),
                    Err(e) => {
                        debug!(%e, "unparseable request line");
                        json!({
                            "response_type": "exception",
                            "response_code": 70,
                            "msg": "malformed message",
                        })
                    }
                };

                let mut out = serde_json::to_string(&reply)
                    .map_err(|e| ServerError::Encode(e.to_string()))?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
            }
        }
    }

    Ok(())
}
