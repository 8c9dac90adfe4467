//! Graceful shutdown utilities using CancellationToken
//!
//! Shutdown coordination uses `tokio_util::sync::CancellationToken`: tokens
//! clone and share across tasks, child tokens cancel with their parent, and
//! cancellation can be checked without consuming the token.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates graceful shutdown across the listener and its connections
#[derive(Clone)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    /// Create a controller that only shuts down on request
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Create a controller that also listens for Ctrl+C
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl+C, initiating graceful shutdown");
                    token.cancel();
                }
                Err(e) => {
                    warn!("failed to listen for Ctrl+C: {}", e);
                }
            }
        });

        controller
    }

    /// A child token cancelled when this controller shuts down
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// A clone of the main token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger shutdown manually
    pub fn shutdown(&self) {
        info!("manual shutdown triggered");
        self.token.cancel();
    }

    /// True once shutdown has been triggered
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for shutdown to be triggered
    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}

/// Convenience: a token that cancels on Ctrl+C
pub fn shutdown_signal() -> CancellationToken {
    ShutdownController::with_ctrl_c().token()
}
