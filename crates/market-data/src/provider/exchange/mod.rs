//! Exchange OHLCV pair converter.
//!
//! Prices a pair straight from an exchange's candle history. Candles are
//! requested from the finest timeframe upward until one exists at the
//! requested timestamp, so the bar is as narrow as the exchange allows.
//!
//! Exchanges plug in through [`OhlcvSource`]; [`binance_converter`] wires the
//! Binance source and locks routing to it.

mod binance;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, Timeframe};
use crate::provider::{PairConverter, UNKNOWN_EXCHANGE};

pub use binance::{BinanceConfig, BinanceSource, BINANCE, BINANCE_BASE_URL};

/// Provider ID constant
const PROVIDER_ID: &str = "exchange-ohlcv";

/// One exchange candle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Whether this `timeframe` candle opens less than one timeframe after `at`.
    ///
    /// Exchanges answer with the first candle at or after the requested start,
    /// which for a timestamp before listing is a candle from listing day.
    pub fn opens_near(&self, at: DateTime<Utc>, timeframe: Timeframe) -> bool {
        let limit = at
            .checked_add_signed(timeframe.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.open_time < limit
    }
}

/// A base/quote market, e.g. BTC/USDT.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarketSymbol {
    pub base: String,
    pub quote: String,
}

impl MarketSymbol {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }

    /// Exchange-native concatenated form (`BTCUSDT`).
    pub fn joined(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for MarketSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Candle history of one exchange.
#[async_trait]
pub trait OhlcvSource: Send + Sync {
    /// Exchange name as hosts spell it (e.g. "Binance.com").
    fn exchange(&self) -> &'static str;

    /// Fetch up to `limit` candles of `timeframe` opening at or after `since`.
    ///
    /// Returns `Ok(None)` when the exchange doesn't list `market`, and an
    /// empty vector when it does but has no candle there.
    async fn fetch_ohlcv(
        &self,
        market: &MarketSymbol,
        timeframe: Timeframe,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<Vec<Candle>>, MarketDataError>;
}

/// [`PairConverter`] over one or more exchanges' candle history.
pub struct ExchangeConverter {
    sources: HashMap<&'static str, Arc<dyn OhlcvSource>>,
    default_exchange: &'static str,
    exchange_locked: bool,
}

impl ExchangeConverter {
    /// Create a converter whose default exchange is `default_source`.
    pub fn new(default_source: Arc<dyn OhlcvSource>) -> Self {
        let default_exchange = default_source.exchange();
        let mut sources: HashMap<&'static str, Arc<dyn OhlcvSource>> = HashMap::new();
        sources.insert(default_exchange, default_source);

        Self {
            sources,
            default_exchange,
            exchange_locked: false,
        }
    }

    /// Register another exchange that hints may route to.
    pub fn with_source(mut self, source: Arc<dyn OhlcvSource>) -> Self {
        self.sources.insert(source.exchange(), source);
        self
    }

    /// Route every request to the default exchange regardless of the hint.
    pub fn locked(mut self, exchange_locked: bool) -> Self {
        self.exchange_locked = exchange_locked;
        self
    }

    pub fn default_exchange(&self) -> &'static str {
        self.default_exchange
    }

    pub fn is_locked(&self) -> bool {
        self.exchange_locked
    }

    /// Pick the exchange a request for `hint` goes to.
    pub fn select_exchange(&self, hint: &str) -> &'static str {
        if self.exchange_locked {
            debug!("Price routing locked to {} for {}", self.default_exchange, hint);
            return self.default_exchange;
        }
        if hint.is_empty() || hint == UNKNOWN_EXCHANGE {
            debug!("Using default exchange {} for {}", self.default_exchange, hint);
            return self.default_exchange;
        }
        match self.sources.get_key_value(hint) {
            Some((name, _)) => *name,
            None => {
                debug!("No source for {}, using default exchange {}", hint, self.default_exchange);
                self.default_exchange
            }
        }
    }
}

#[async_trait]
impl PairConverter for ExchangeConverter {
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
        let exchange = self.select_exchange(exchange);
        let Some(source) = self.sources.get(exchange) else {
            return Ok(None);
        };
        let market = MarketSymbol::new(from_asset, to_asset);

        for timeframe in Timeframe::LADDER {
            let Some(candles) = source.fetch_ohlcv(&market, timeframe, timestamp, 1).await? else {
                debug!("{} does not list {}", exchange, market);
                return Ok(None);
            };

            let Some(candle) = candles.into_iter().next() else {
                continue;
            };
            if !candle.opens_near(timestamp, timeframe) {
                debug!(
                    "{} {} candle for {} opens at {}, after {}",
                    exchange, timeframe, market, candle.open_time, timestamp
                );
                continue;
            }

            debug!("{} {} candle for {} at {}", exchange, timeframe, market, timestamp);
            return Ok(Some(HistoricalBar {
                duration: timeframe.duration(),
                timestamp,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
            }));
        }

        debug!("No {} candle on {} at {}", market, exchange, timestamp);
        Ok(None)
    }
}

/// Binance-only converter: default exchange Binance.com, routing locked.
pub fn binance_converter(config: BinanceConfig) -> Result<ExchangeConverter, MarketDataError> {
    let source = Arc::new(BinanceSource::new(config)?);
    Ok(ExchangeConverter::new(source).locked(true))
}
