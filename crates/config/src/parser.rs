//! Config file loading and saving

use std::path::Path;

use crate::error::ConfigError;
use crate::substitution::substitute_env;
use crate::MasterConfig;

/// Load, substitute and parse a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let substituted = substitute_env(&raw)?;
    let config = serde_yaml::from_str(&substituted)?;
    Ok(config)
}

/// Serialize a configuration to a file
pub fn save_config<P: AsRef<Path>>(config: &MasterConfig, path: P) -> Result<(), ConfigError> {
    let raw = serde_yaml::to_string(config)?;
    std::fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_default_config;

    #[test]
    fn test_load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bourse.yaml");
        std::fs::write(
            &path,
            concat!(
                "exchange:\n",
                "  name: Bourse\n",
                "  version: \"0.1.0\"\n",
                "listings:\n",
                "  - symbol: STI.\n",
                "    name: Sam and Tom Industrys\n",
            ),
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.exchange.name, "Bourse");
        assert_eq!(config.server.port, 7654);
        assert_eq!(config.listings.len(), 1);
        assert_eq!(config.listings[0].symbol, "STI.");
        assert!(config.listings[0].reference_price.is_none());
        assert!(config.brokers.is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bourse.yaml");

        let config = generate_default_config();
        save_config(&config, &path).unwrap();
        let reloaded = load_config(&path).unwrap();

        assert_eq!(reloaded.exchange.name, config.exchange.name);
        assert_eq!(reloaded.listings.len(), config.listings.len());
        assert_eq!(reloaded.brokers.len(), config.brokers.len());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/bourse.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
