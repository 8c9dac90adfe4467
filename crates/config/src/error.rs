//! Configuration error types

use thiserror::Error;

/// Errors surfaced while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML did not parse into the expected shape
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference had no value and no default
    #[error("environment variable {0} is not set and has no default")]
    MissingVariable(String),
}
