//! Versioned in-memory storage for Bourse
//!
//! Every mutation in the exchange flows through a unit of work built from
//! the pieces in this crate:
//!
//! - [`MemoryStore`] holds the committed records, each with a version
//!   counter.
//! - [`Session`] is the staging half of a unit of work: reads clone the
//!   committed record and pin its version (read committed), writes
//!   accumulate privately.
//! - [`Session::prepare`] takes the store's write lock and verifies every
//!   pinned version; [`Prepared::apply`] then installs the staged records.
//!   Preparing several sessions before applying any of them gives
//!   all-or-nothing commits across stores.
//!
//! Dropping a session (or a prepared guard) without applying is rollback:
//! staged writes are discarded and the committed state is untouched.

pub mod error;
pub mod session;
pub mod store;

pub use error::{Result, StorageError};
pub use session::{Prepared, Session};
pub use store::{MemoryStore, Record, Versioned};
