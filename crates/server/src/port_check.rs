//! Port availability probe
//!
//! Binds the configured address and immediately releases it, so a port held
//! by another process is reported as such before the exchange commits to
//! starting. The `validate` command uses the same probe to warn an operator
//! ahead of time.

use tokio::net::TcpListener;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Check that the configured address can be bound
///
/// Port 0 always passes: it asks the OS for an ephemeral port. The probe is
/// advisory; the listener can still lose the port to another process
/// between the check and the real bind.
pub async fn validate_port_available(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Ok(());
    }

    let addr = config.bind_addr();
    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            debug!(%addr, "port available");
            drop(listener);
            Ok(())
        }
        Err(source) => Err(ServerError::PortUnavailable { addr, source }),
    }
}
