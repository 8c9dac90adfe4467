//! Ledger error types

use thiserror::Error;

/// Errors surfaced by screening and settlement
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No client registered under this id
    #[error("unknown user {0}")]
    UnknownClient(String),

    /// Buy screen failed: order cost exceeds the client's cash
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Sell screen failed: order volume exceeds the client's holding
    #[error("insufficient holding")]
    InsufficientHolding,

    /// A ledger adjustment would leave the client's cash negative.
    /// Screening should have prevented this; treated as an internal
    /// invariant breach, fatal to the message.
    #[error("balance of {0} would go negative")]
    NegativeBalance(String),

    /// A ledger adjustment would leave a holding negative
    #[error("holding {symbol} of {csid} would go negative")]
    NegativeHolding {
        /// Client id
        csid: String,
        /// Instrument symbol
        symbol: String,
    },

    /// Underlying storage failure (version conflict)
    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}

/// Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
