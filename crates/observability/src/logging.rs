//! Logging initialization
//!
//! The exchange logs through `tracing`; this module builds the subscriber
//! from the operator's `logging:` configuration section. `RUST_LOG` always
//! wins over the configured level, so an operator can raise verbosity on a
//! running host without editing the exchange's config file.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Log output format, as written in the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for an operator's terminal (default)
    #[default]
    Pretty,
    /// JSON lines for log aggregation
    Json,
    /// One dense line per event, for long-running sessions
    Compact,
}

impl LogFormat {
    /// The accepted `logging.format` values
    pub const ACCEPTED: [&'static str; 3] = ["pretty", "json", "compact"];
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "unknown log format {:?} (expected one of {:?})",
                other,
                Self::ACCEPTED
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Compact => write!(f, "compact"),
        }
    }
}

/// How the exchange should log, resolved from configuration
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Service name stamped on the startup event
    pub service: String,
    /// Output format
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `exchange=debug,info`
    pub directive: String,
}

impl LoggingOptions {
    /// Resolve options from the config file's `logging:` section
    pub fn from_config(
        service: impl Into<String>,
        format: &str,
        level: &str,
    ) -> anyhow::Result<Self> {
        let format = format.parse::<LogFormat>().map_err(|e| anyhow!(e))?;
        Ok(Self {
            service: service.into(),
            format,
            directive: level.to_string(),
        })
    }
}

/// Install the global subscriber
///
/// Call once, after configuration is loaded and before the exchange starts
/// accepting connections. Fails if a subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.directive));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match options.format {
        LogFormat::Pretty => builder
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install subscriber: {}", e))?;

    tracing::info!(
        service = %options.service,
        format = %options.format,
        directive = %options.directive,
        "logging initialized"
    );

    Ok(())
}
