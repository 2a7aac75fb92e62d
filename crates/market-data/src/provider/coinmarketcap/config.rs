use std::fmt;
use std::time::Duration;

use crate::errors::MarketDataError;

pub const PRODUCTION_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.coinmarketcap.com";

/// Public key published for the sandbox environment.
pub const SANDBOX_API_KEY: &str = "b54bcf4d-1bca-4e8e-9a24-22ff2c3d462c";

pub const API_KEY_VAR: &str = "COINMARKETCAP_API_KEY";
pub const BASE_URL_VAR: &str = "COINMARKETCAP_BASE_URL";
pub const TIMEOUT_VAR: &str = "COINMARKETCAP_TIMEOUT_SECS";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which CoinMarketCap environment the credential belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMode {
    Production,
    /// Sandbox responses carry fabricated prices and don't echo real
    /// symbols. Bars produced in this mode are never returned to the host.
    Sandbox,
}

/// CoinMarketCap connection settings.
#[derive(Clone)]
pub struct CoinMarketCapConfig {
    pub api_key: String,
    pub mode: ApiMode,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl CoinMarketCapConfig {
    pub fn production(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            mode: ApiMode::Production,
            base_url: PRODUCTION_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn sandbox() -> Self {
        Self {
            api_key: SANDBOX_API_KEY.to_string(),
            mode: ApiMode::Sandbox,
            base_url: SANDBOX_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load settings from the process environment.
    ///
    /// A missing or blank `COINMARKETCAP_API_KEY` selects the sandbox.
    pub fn from_env() -> Result<Self, MarketDataError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MarketDataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty()) {
            Some(key) => Self::production(key.trim()),
            None => Self::sandbox(),
        };

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config = config.with_base_url(base_url.trim());
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                MarketDataError::InvalidConfig(format!(
                    "{} must be whole seconds, got '{}'",
                    TIMEOUT_VAR, raw
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn is_sandbox(&self) -> bool {
        self.mode == ApiMode::Sandbox
    }
}

impl fmt::Debug for CoinMarketCapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinMarketCapConfig")
            .field("api_key", &"***")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_key_selects_sandbox() {
        let config = CoinMarketCapConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mode, ApiMode::Sandbox);
        assert_eq!(config.api_key, SANDBOX_API_KEY);
        assert_eq!(config.base_url, SANDBOX_BASE_URL);
    }

    #[test]
    fn test_blank_key_selects_sandbox() {
        let config = CoinMarketCapConfig::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap();
        assert!(config.is_sandbox());
    }

    #[test]
    fn test_key_selects_production() {
        let config =
            CoinMarketCapConfig::from_lookup(lookup(&[(API_KEY_VAR, "live-key")])).unwrap();
        assert_eq!(config.mode, ApiMode::Production);
        assert_eq!(config.api_key, "live-key");
        assert_eq!(config.base_url, PRODUCTION_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = CoinMarketCapConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "live-key"),
            (BASE_URL_VAR, "http://127.0.0.1:8080/"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.mode, ApiMode::Production);
    }

    #[test]
    fn test_invalid_timeout() {
        let result = CoinMarketCapConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")]));
        assert!(matches!(result, Err(MarketDataError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let config = CoinMarketCapConfig::production("secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
