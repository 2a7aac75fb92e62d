//! CoinMarketCap pair converter.
//!
//! Prices a crypto asset against a crypto or fiat quote currency from
//! CoinMarketCap's historical quotes:
//! - `/v1/cryptocurrency/map` and `/v1/fiat/map` resolve tickers to ids
//! - `/v2/cryptocurrency/quotes/historical` returns the samples
//!
//! Each bar is built from two samples five minutes apart, starting at the
//! requested timestamp. High and low are therefore the extremes of two
//! prices, and volume is the growth of the rolling 24h volume between them.
//!
//! API documentation: https://coinmarketcap.com/api/documentation/v1/

mod client;
mod config;
mod fetcher;
mod models;
mod resolver;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::errors::MarketDataError;
use crate::models::{AssetRef, HistoricalBar, Timeframe};
use crate::normalize::normalize;
use crate::provider::PairConverter;

pub use client::CoinMarketCapClient;
pub use config::{
    ApiMode, CoinMarketCapConfig, API_KEY_VAR, BASE_URL_VAR, PRODUCTION_BASE_URL,
    SANDBOX_API_KEY, SANDBOX_BASE_URL, TIMEOUT_VAR,
};
pub use fetcher::{QuoteFetcher, PLAN_UNAVAILABLE};
pub use resolver::SymbolResolver;

/// Provider ID constant
const PROVIDER_ID: &str = "coinmarketcap.com";

/// Samples per bar
const SAMPLE_COUNT: u32 = 2;

/// Spacing between samples
const SAMPLE_INTERVAL: Timeframe = Timeframe::FiveMinutes;

/// CoinMarketCap implementation of [`PairConverter`].
///
/// # Example
///
/// ```ignore
/// use barfeed_market_data::provider::coinmarketcap::{CoinMarketCapConfig, CoinMarketCapConverter};
///
/// let converter = CoinMarketCapConverter::new(CoinMarketCapConfig::from_env()?)?;
/// ```
pub struct CoinMarketCapConverter {
    fetcher: QuoteFetcher,
    mode: ApiMode,
}

impl CoinMarketCapConverter {
    pub fn new(config: CoinMarketCapConfig) -> Result<Self, MarketDataError> {
        let client = Arc::new(CoinMarketCapClient::new(&config)?);
        let resolver = SymbolResolver::new(Arc::clone(&client), config.mode);

        if config.mode == ApiMode::Sandbox {
            info!("CoinMarketCap running against the sandbox; bars will not be returned");
        }

        Ok(Self {
            fetcher: QuoteFetcher::new(client, resolver),
            mode: config.mode,
        })
    }

    /// Build from `COINMARKETCAP_*` environment variables.
    pub fn from_env() -> Result<Self, MarketDataError> {
        Self::new(CoinMarketCapConfig::from_env()?)
    }

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    pub fn fetcher(&self) -> &QuoteFetcher {
        &self.fetcher
    }
}

#[async_trait]
impl PairConverter for CoinMarketCapConverter {
    fn name(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_historic_bar(
        &self,
        timestamp: DateTime<Utc>,
        from_asset: &str,
        to_asset: &str,
        exchange: &str,
    ) -> Result<Option<HistoricalBar>, MarketDataError> {
        debug!(
            "CoinMarketCap bar {} -> {} at {} (exchange hint {} ignored)",
            from_asset, to_asset, timestamp, exchange
        );

        let window = self
            .fetcher
            .fetch(
                timestamp,
                SAMPLE_COUNT,
                SAMPLE_INTERVAL,
                &AssetRef::from(from_asset),
                &AssetRef::from(to_asset),
            )
            .await?;

        let Some(window) = window else {
            return Ok(None);
        };

        let bar = normalize(&window);

        // Sandbox prices are fabricated; never let them into the host cache.
        if self.mode == ApiMode::Sandbox {
            info!(
                "Discarding sandbox bar for {} -> {} at {}",
                from_asset, to_asset, timestamp
            );
            return Ok(None);
        }

        Ok(Some(bar))
    }
}
