//! Server configuration
//!
//! The listener binds `EXCHANGE_HOST`/`EXCHANGE_PORT` when set; otherwise
//! whatever the caller configured (typically the config file), falling back
//! to localhost on the default port.

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port
pub const DEFAULT_PORT: u16 = 7654;

/// Listener binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind (name or address)
    pub host: String,
    /// Port to bind; 0 asks the OS for an ephemeral port
    pub port: u16,
}

impl ServerConfig {
    /// Create a config from explicit host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Apply `EXCHANGE_HOST`/`EXCHANGE_PORT` over this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("EXCHANGE_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }
        if let Some(port) = std::env::var("EXCHANGE_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.port = port;
        }
        self
    }

    /// The `host:port` string handed to the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
