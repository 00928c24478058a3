//! Application configuration loading from config.toml
//!
//! Every section and field has a default, so a missing file or a partial file is
//! fine. Secrets never live here; they come from the environment.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Checkout settings
    pub orders: OrderConfig,
    /// Token settings
    pub auth: AuthConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API binds to
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Checkout settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Leading part of every order number
    pub number_prefix: String,
    /// Shipping fee charged when the request does not name one
    pub default_shipping_price: f64,
    /// How many random order numbers to try before giving up
    pub number_attempts: u32,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            number_prefix: "DD".to_string(),
            default_shipping_price: 40.0,
            number_attempts: 5,
        }
    }
}

/// Token settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of issued bearer tokens
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: 168,
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `./config.toml`, or defaults when the file is absent.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!("No config.toml found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Reads the token signing secret from `JWT_SECRET`.
pub fn jwt_secret() -> Result<String> {
    std::env::var("JWT_SECRET").map_err(|_| Error::Config {
        message: "JWT_SECRET must be set".to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_addr = "127.0.0.1:8080"

            [orders]
            number_prefix = "DDK"
            default_shipping_price = 25.5
            number_attempts = 3

            [auth]
            token_ttl_hours = 24
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.orders.number_prefix, "DDK");
        assert_eq!(config.orders.default_shipping_price, 25.5);
        assert_eq!(config.orders.number_attempts, 3);
        assert_eq!(config.auth.token_ttl_hours, 24);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
            [orders]
            number_prefix = "X"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orders.number_prefix, "X");
        assert_eq!(config.orders.default_shipping_price, 40.0);
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
