//! Environment substitution
//!
//! Replaces `${VAR}` and `${VAR:-default}` references in the raw config
//! text before it is parsed, so secrets and per-host values never live in
//! the file itself.

use regex::Regex;

use crate::error::ConfigError;

/// Substitute `${VAR}` / `${VAR:-default}` references from the environment
pub fn substitute_env(raw: &str) -> Result<String, ConfigError> {
    substitute(raw, |name| std::env::var(name).ok())
}

fn substitute(
    raw: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    // Compiled on every load; config loading is a once-per-process path.
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("substitution pattern is valid");

    let mut result = String::with_capacity(raw.len());
    let mut last_end = 0;

    for captures in pattern.captures_iter(raw) {
        let whole = captures.get(0).expect("capture 0 always present");
        let name = &captures[1];
        let default = captures.get(2).map(|m| m.as_str().to_string());

        let value = match lookup(name).or(default) {
            Some(value) => value,
            None => return Err(ConfigError::MissingVariable(name.to_string())),
        };

        result.push_str(&raw[last_end..whole.start()]);
        result.push_str(&value);
        last_end = whole.end();
    }
    result.push_str(&raw[last_end..]);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_env(name: &str) -> Option<String> {
        match name {
            "EXCHANGE_PORT" => Some("7700".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_substitutes_known_variable() {
        let out = substitute("port: ${EXCHANGE_PORT}", fake_env).unwrap();
        assert_eq!(out, "port: 7700");
    }

    #[test]
    fn test_falls_back_to_default() {
        let out = substitute("host: ${EXCHANGE_HOST:-0.0.0.0}", fake_env).unwrap();
        assert_eq!(out, "host: 0.0.0.0");
    }

    #[test]
    fn test_env_wins_over_default() {
        let out = substitute("port: ${EXCHANGE_PORT:-7654}", fake_env).unwrap();
        assert_eq!(out, "port: 7700");
    }

    #[test]
    fn test_missing_variable_without_default() {
        let err = substitute("key: ${NO_SUCH_VAR}", fake_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(name) if name == "NO_SUCH_VAR"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let raw = "name: Bourse\nport: 7654\n";
        assert_eq!(substitute(raw, fake_env).unwrap(), raw);
    }
}
