//! Host-facing pair converter trait.
//!
//! This module defines the `PairConverter` trait that every price source
//! implements so the host can ask it for a historical bar.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::HistoricalBar;

/// Exchange hint passed by hosts that don't know where a trade happened.
pub const UNKNOWN_EXCHANGE: &str = "__unknown";

/// A source of historical price bars for asset pairs.
///
/// The host owns caching: it looks up
/// [`AssetPairAndTimestamp`](crate::models::AssetPairAndTimestamp) in its
/// cache partition (see [`cache_key`](Self::cache_key)) and only calls
/// [`get_historic_bar`](Self::get_historic_bar) on a miss.
///
/// # Example
///
/// ```ignore
/// use barfeed_market_data::provider::PairConverter;
///
/// let bar = converter
///     .get_historic_bar(timestamp, "BTC", "USD", "Coinbase")
///     .await?;
/// match bar {
///     Some(bar) => println!("{}", bar.close),
///     None => println!("try another converter"),
/// }
/// ```
#[async_trait]
pub trait PairConverter: Send + Sync {
    /// Provider identifier, e.g. `"coinmarketcap.com"`.
    fn name(&self) -> &'static str;

    /// Partition of the host cache this converter's bars are stored in.
    fn cache_key(&self) -> String {
        self.name().to_string()
    }

    /// Fetch the bar starting at `timestamp` for `from_asset` priced in
    /// `to_asset`.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Start of the bar (UTC)
    /// * `from_asset` - Ticker of the asset being priced (e.g. "BTC")
    /// * `to_asset` - Ticker of the quote asset (e.g. "USD")
    /// * `exchange` - Where the trade happened; converters may ignore it
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bar))` - A price was found
    /// * `Ok(None)` - This converter has no price; the host may fall back
    /// * `Err(error)` - Lookup failed; see [`MarketDataError::retry_class`]
    async fn get_historic_bar(
        &self,
        timestamp: DateTime<Utc>,
        from_asset: &str,
        to_asset: &str,
        exchange: &str,
    ) -> Result<Option<HistoricalBar>, MarketDataError>;
}
