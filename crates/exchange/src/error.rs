//! Exchange-level errors and their wire representation
//!
//! Every error carries the `(response_code, msg)` pair the protocol
//! promises: code 1 for gate rejections, 404 for unknown identities, 77 for
//! screening failures, 70 for everything else recoverable.

use settlement::LedgerError;
use thiserror::Error;

/// A message-level failure, reported to the caller and fatal only to the
/// current message
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The txid has been seen before
    #[error("duplicate transaction")]
    Duplicate,

    /// The sender's clock is more than the staleness window behind
    #[error("stale transaction")]
    Stale,

    /// Unrecognized `message_type`
    #[error("unknown message_type")]
    UnknownMessage,

    /// `broker_id` is not a registered broker
    #[error("malformed broker")]
    MalformedBroker,

    /// `account_id` is not known to the broker
    #[error("unknown user")]
    UnknownUser,

    /// `symbol` is not listed
    #[error("unknown symbol")]
    UnknownSymbol,

    /// Pre-trade screening rejected the order
    #[error("{0}")]
    Screening(LedgerError),

    /// A unit of work lost an optimistic-concurrency race; retried a fixed
    /// number of times before surfacing
    #[error("concurrent transaction conflict")]
    Conflict,

    /// Any other validation failure
    #[error("{0}")]
    Validation(String),
}

impl ExchangeError {
    /// The protocol response code for this error
    pub fn response_code(&self) -> u16 {
        match self {
            ExchangeError::Duplicate | ExchangeError::Stale | ExchangeError::UnknownMessage => 1,
            ExchangeError::MalformedBroker
            | ExchangeError::UnknownUser
            | ExchangeError::UnknownSymbol => 404,
            ExchangeError::Screening(_) => 77,
            ExchangeError::Conflict | ExchangeError::Validation(_) => 70,
        }
    }
}

impl From<LedgerError> for ExchangeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance | LedgerError::InsufficientHolding => {
                ExchangeError::Screening(err)
            }
            LedgerError::UnknownClient(_) => ExchangeError::UnknownUser,
            LedgerError::Storage(_) => ExchangeError::Conflict,
            other => ExchangeError::Validation(other.to_string()),
        }
    }
}

impl From<oms::OmsError> for ExchangeError {
    fn from(err: oms::OmsError) -> Self {
        match err {
            oms::OmsError::Storage(_) => ExchangeError::Conflict,
            other => ExchangeError::Validation(other.to_string()),
        }
    }
}

impl From<storage::StorageError> for ExchangeError {
    fn from(_: storage::StorageError) -> Self {
        ExchangeError::Conflict
    }
}
