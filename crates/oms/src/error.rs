//! Order management error types

use thiserror::Error;

/// Errors surfaced by the order repository and order domain operations
#[derive(Error, Debug)]
pub enum OmsError {
    /// No order with the given transaction id
    #[error("unknown order {0}")]
    UnknownOrder(String),

    /// Split attempted on a buy order
    #[error("cannot split a non-sell order")]
    SplitNonSell,

    /// Split volume must carve out a strict subset of the parent
    #[error("invalid split volume {excess} for order of volume {volume}")]
    SplitVolume {
        /// Requested residual volume
        excess: u64,
        /// Parent order volume
        volume: u64,
    },

    /// Underlying storage failure (version conflict)
    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}

/// Result type for order repository operations
pub type OmsResult<T> = std::result::Result<T, OmsError>;
