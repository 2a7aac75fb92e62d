//! Barfeed Market Data Crate
//!
//! Fetches historical crypto price bars from market-data providers and
//! normalizes them into one [`HistoricalBar`] format for a cost-basis host.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |       Host       | --> |  PairConverter   |  (cache miss only)
//! +------------------+     +------------------+
//!                                  |
//!                  +---------------+---------------+
//!                  v                               v
//!        +-------------------+          +-------------------+
//!        | CoinMarketCap     |          | ExchangeConverter |
//!        |  SymbolResolver   |          |  OhlcvSource      |
//!        |  QuoteFetcher     |          |  (Binance)        |
//!        +-------------------+          +-------------------+
//!                  |                               |
//!                  v                               |
//!        +-------------------+                     |
//!        |    QuoteWindow    |                     |
//!        +-------------------+                     |
//!                  |  normalize                    |
//!                  v                               v
//!        +---------------------------------------------------+
//!        |                   HistoricalBar                   |
//!        +---------------------------------------------------+
//! ```
//!
//! # Absence vs. failure
//!
//! Not finding a price is routine in a multi-provider pipeline, so it is
//! `Ok(None)`. Errors are reserved for things the host must decide about;
//! see [`MarketDataError::retry_class`].

pub mod errors;
pub mod models;
pub mod normalize;
pub mod provider;

pub use errors::{ErrorKind, MarketDataError, RetryClass};

pub use models::{
    AssetClass, AssetId, AssetPairAndTimestamp, AssetRef, HistoricalBar, QuoteSample, QuoteWindow,
    Timeframe,
};

pub use normalize::normalize;

pub use provider::coinmarketcap::{ApiMode, CoinMarketCapConfig, CoinMarketCapConverter};
pub use provider::exchange::{
    binance_converter, BinanceConfig, BinanceSource, ExchangeConverter, OhlcvSource,
};
pub use provider::{PairConverter, UNKNOWN_EXCHANGE};
