//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::rate_limit::INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Allowed client origins for CORS, comma-separated; `*` allows any
    pub client_origin: String,
    /// Inbound WebSocket messages allowed per second per connection
    pub input_rate_limit: u32,
    /// Seed for spawn selection and shotgun spread; random per run when unset
    pub arena_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosts like Render provide PORT; fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let input_rate_limit = match lookup("INPUT_RATE_LIMIT") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("INPUT_RATE_LIMIT"))?,
            None => INPUT_RATE_LIMIT,
        };

        let arena_seed = lookup("ARENA_SEED")
            .map(|v| v.parse::<u64>().map_err(|_| ConfigError::Invalid("ARENA_SEED")))
            .transpose()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
            input_rate_limit,
            arena_seed,
        })
    }

    /// True when CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.client_origin.trim() == "*"
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.allows_any_origin());
        assert_eq!(config.input_rate_limit, INPUT_RATE_LIMIT);
        assert_eq!(config.arena_seed, None);
    }

    #[test]
    fn test_explicit_seed() {
        assert_eq!(load(&[("ARENA_SEED", "42")]).unwrap().arena_seed, Some(42));
    }

    #[test]
    fn test_port_wins_over_server_addr() {
        let config = load(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:1")]).unwrap();
        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("SERVER_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddress)
        ));
        assert!(matches!(
            load(&[("INPUT_RATE_LIMIT", "0")]),
            Err(ConfigError::Invalid("INPUT_RATE_LIMIT"))
        ));
        assert!(matches!(
            load(&[("ARENA_SEED", "-3")]),
            Err(ConfigError::Invalid("ARENA_SEED"))
        ));
    }

    #[test]
    fn test_json_log_format() {
        assert!(load(&[("LOG_FORMAT", "JSON")]).unwrap().log_json);
        assert!(!load(&[("LOG_FORMAT", "pretty")]).unwrap().log_json);
    }

    #[test]
    fn test_explicit_origin() {
        let config = load(&[("CLIENT_ORIGIN", "https://play.example.com")]).unwrap();
        assert!(!config.allows_any_origin());
    }
}
