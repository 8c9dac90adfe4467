//! Observability utilities for Bourse
//!
//! The exchange logs through `tracing`; this crate resolves the operator's
//! `logging:` configuration into subscriber options and installs the global
//! subscriber.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingOptions};
