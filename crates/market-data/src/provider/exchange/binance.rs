//! Binance spot klines.
//!
//! `GET /api/v3/klines` returns candles as positional arrays:
//! `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`
//! with prices as decimal strings.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Candle, MarketSymbol, OhlcvSource};
use crate::errors::MarketDataError;
use crate::models::Timeframe;

pub const BINANCE: &str = "Binance.com";
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

const KLINES_PATH: &str = "/api/v3/klines";

/// Binance error code for an unknown market.
const INVALID_SYMBOL: i64 = -1121;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const BASE_URL_VAR: &str = "BINANCE_BASE_URL";
pub const TIMEOUT_VAR: &str = "BINANCE_TIMEOUT_SECS";

/// Binance connection settings.
#[derive(Clone, Debug)]
pub struct BinanceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl BinanceConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn from_env() -> Result<Self, MarketDataError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MarketDataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
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
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// Error body returned with 4xx responses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: i64,
    msg: String,
}

/// Binance spot candle history.
pub struct BinanceSource {
    client: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new(config: BinanceConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| MarketDataError::Network {
                provider: BINANCE.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OhlcvSource for BinanceSource {
    fn exchange(&self) -> &'static str {
        BINANCE
    }

    async fn fetch_ohlcv(
        &self,
        market: &MarketSymbol,
        timeframe: Timeframe,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<Vec<Candle>>, MarketDataError> {
        let url = format!("{}{}", self.base_url, KLINES_PATH);
        let params = [
            ("symbol", market.joined()),
            ("interval", timeframe.as_str().to_string()),
            ("startTime", since.timestamp_millis().to_string()),
            ("limit", limit.to_string()),
        ];
        debug!("Binance request: {} {:?}", KLINES_PATH, params);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|source| MarketDataError::Network {
                provider: BINANCE.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| MarketDataError::Network {
                provider: BINANCE.to_string(),
                source,
            })?;

        if !status.is_success() {
            return match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) if error.code == INVALID_SYMBOL => Ok(None),
                Ok(error) => Err(MarketDataError::ServerError {
                    provider: BINANCE.to_string(),
                    code: error.code,
                    message: error.msg,
                }),
                Err(_) => Err(MarketDataError::ServerError {
                    provider: BINANCE.to_string(),
                    code: i64::from(status.as_u16()),
                    message: body.chars().take(200).collect(),
                }),
            };
        }

        let rows: Vec<Vec<Value>> =
            serde_json::from_str(&body).map_err(|source| MarketDataError::Parse {
                provider: BINANCE.to_string(),
                source,
            })?;

        rows.iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn parse_kline(row: &[Value]) -> Result<Candle, MarketDataError> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| MarketDataError::data(BINANCE, "kline without open time"))?;

    let field = |idx: usize, name: &str| -> Result<Decimal, MarketDataError> {
        let value = row
            .get(idx)
            .ok_or_else(|| MarketDataError::data(BINANCE, format!("kline without {}", name)))?;
        let parsed = match value {
            Value::String(s) => Decimal::from_str(s).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            MarketDataError::data(BINANCE, format!("invalid kline {}: {}", name, value))
        })
    };

    Ok(Candle {
        open_time,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_parse_kline() {
        let row: Vec<Value> = serde_json::from_str(
            r#"[1590969600000, "9445.83000000", "9447.52000000", "9430.01000000",
                "9435.80000000", "120.42000000", 1590969659999, "1136000.1", 1000,
                "60.1", "567000.2", "0"]"#,
        )
        .unwrap();

        let candle = parse_kline(&row).unwrap();
        assert_eq!(candle.open_time, Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(candle.open, dec!(9445.83));
        assert_eq!(candle.high, dec!(9447.52));
        assert_eq!(candle.low, dec!(9430.01));
        assert_eq!(candle.close, dec!(9435.80));
        assert_eq!(candle.volume, dec!(120.42));
    }

    #[test]
    fn test_parse_kline_truncated() {
        let row: Vec<Value> = serde_json::from_str(r#"[1590969600000, "1.0", "2.0"]"#).unwrap();
        let err = parse_kline(&row).unwrap_err();
        assert!(matches!(err, MarketDataError::DataError { .. }));
    }

    #[test]
    fn test_parse_kline_bad_price() {
        let row: Vec<Value> =
            serde_json::from_str(r#"[1590969600000, "x", "2", "1", "1.5", "3"]"#).unwrap();
        assert!(parse_kline(&row).is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> =
            [(BASE_URL_VAR, "http://localhost:9000/"), (TIMEOUT_VAR, "7")].into();
        let config = BinanceConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(7));

        let config = BinanceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, BINANCE_BASE_URL);

        let result = BinanceConfig::from_lookup(|name| (name == TIMEOUT_VAR).then(|| "-".to_string()));
        assert!(matches!(result, Err(MarketDataError::InvalidConfig(_))));
    }
}
