use std::{env, time::Duration};

use anyhow::{Context, Result};
use grid_map::{ServerAddr, ADDRESS_ENV, DEFAULT_CONNECT_TIMEOUT};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub grid_address: ServerAddr,
    pub grid_connect_timeout: Duration,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("APP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let grid_address = lookup(ADDRESS_ENV)
            .filter(|addr| !addr.trim().is_empty())
            .map(ServerAddr::from)
            .unwrap_or_default();

        let grid_connect_timeout = match lookup("GRID_CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("GRID_CONNECT_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        Ok(Self {
            host,
            port,
            grid_address,
            grid_connect_timeout,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_grid() {
        let config = config(&[]).unwrap();

        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.grid_address, ServerAddr::default());
        assert_eq!(config.grid_connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("APP_PORT", "9090"),
            ("GRID_SERVER_ADDRESS", "grid.internal:1408"),
            ("GRID_CONNECT_TIMEOUT_SECS", "1"),
        ])
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.grid_address, ServerAddr::from("grid.internal:1408"));
        assert_eq!(config.grid_connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(config(&[("APP_PORT", "http")]).is_err());
    }
}
