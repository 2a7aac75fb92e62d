use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::client::CoinMarketCapClient;
use super::models::{to_decimal, HistoricalData, QuoteRecord};
use super::resolver::SymbolResolver;
use super::PROVIDER_ID;
use crate::errors::MarketDataError;
use crate::models::{AssetClass, AssetId, AssetRef, QuoteSample, QuoteWindow, Timeframe};

const HISTORICAL_QUOTES_PATH: &str = "/v2/cryptocurrency/quotes/historical";

/// "Endpoint not available on this subscription plan."
pub const PLAN_UNAVAILABLE: i64 = 1006;

/// Requests historical quote windows for asset pairs.
pub struct QuoteFetcher {
    client: Arc<CoinMarketCapClient>,
    resolver: SymbolResolver,
}

impl QuoteFetcher {
    pub fn new(client: Arc<CoinMarketCapClient>, resolver: SymbolResolver) -> Self {
        Self { client, resolver }
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    /// Fetch `sample_count` quotes of `from` priced in `to`, starting at
    /// `timestamp` and spaced by `interval`.
    ///
    /// Returns `Ok(None)` when there is nothing to price:
    /// * `from` is not a known cryptocurrency
    /// * the plan doesn't include historical quotes (1006)
    /// * the provider returned fewer than two samples for the window
    ///
    /// An unknown `to` is an error, because the caller asked for an
    /// unsupported quote currency.
    pub async fn fetch(
        &self,
        timestamp: DateTime<Utc>,
        sample_count: u32,
        interval: Timeframe,
        from: &AssetRef,
        to: &AssetRef,
    ) -> Result<Option<QuoteWindow>, MarketDataError> {
        let from_id = match from {
            AssetRef::Id(id) => *id,
            AssetRef::Symbol(symbol) => {
                match self.resolver.resolve(symbol, AssetClass::Crypto).await {
                    Ok(id) => id,
                    Err(MarketDataError::SymbolNotFound { .. }) => {
                        debug!("{} is not a known cryptocurrency, no data", symbol);
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let to_id = match to {
            AssetRef::Id(id) => *id,
            AssetRef::Symbol(symbol) => self.resolver.resolve_convert(symbol).await?,
        };

        let params = [
            ("id", from_id.to_string()),
            ("convert_id", to_id.to_string()),
            ("time_start", timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("count", sample_count.to_string()),
            ("interval", interval.as_str().to_string()),
        ];
        let envelope = self.client.get(HISTORICAL_QUOTES_PATH, &params).await?;

        match envelope.status.error_code {
            0 => {}
            PLAN_UNAVAILABLE => {
                debug!(
                    "Historical quotes unavailable for this plan: {}",
                    envelope.status.message()
                );
                return Ok(None);
            }
            code => {
                return Err(MarketDataError::ServerError {
                    provider: PROVIDER_ID.to_string(),
                    code,
                    message: envelope.status.message(),
                })
            }
        }

        if envelope.data.is_null() {
            debug!("No historical data for {} -> {} at {}", from, to, timestamp);
            return Ok(None);
        }

        let data: HistoricalData =
            serde_json::from_value(envelope.data).map_err(|source| MarketDataError::Parse {
                provider: PROVIDER_ID.to_string(),
                source,
            })?;
        if matches!(data, HistoricalData::Flat(_)) {
            warn!("Historical quotes returned without an id key");
        }

        let Some(records) = data.into_quotes(from_id) else {
            debug!("Response carries no quotes for id {}", from_id);
            return Ok(None);
        };

        let samples = records
            .iter()
            .map(|record| to_sample(record, to_id))
            .collect::<Result<Vec<_>, _>>()?;

        let received = samples.len();
        let Some(window) = QuoteWindow::new(timestamp, interval, samples) else {
            debug!(
                "Only {} of {} samples for {} -> {} at {}",
                received, sample_count, from, to, timestamp
            );
            return Ok(None);
        };

        // The provider answers with the next quotes it has, however late.
        let end = window_end(timestamp, interval, sample_count);
        if window.first().timestamp >= end {
            debug!(
                "Quotes for {} -> {} start at {}, past the window {} - {}",
                from,
                to,
                window.first().timestamp,
                timestamp,
                end
            );
            return Ok(None);
        }

        Ok(Some(window))
    }
}

/// End (exclusive) of `sample_count` intervals starting at `start`.
fn window_end(start: DateTime<Utc>, interval: Timeframe, sample_count: u32) -> DateTime<Utc> {
    i32::try_from(sample_count)
        .ok()
        .and_then(|count| interval.duration().checked_mul(count))
        .and_then(|span| start.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn to_sample(record: &QuoteRecord, convert_id: AssetId) -> Result<QuoteSample, MarketDataError> {
    let values = record.quote.get(&convert_id.to_string()).ok_or_else(|| {
        MarketDataError::data(
            PROVIDER_ID,
            format!("quote has no block for convert id {}", convert_id),
        )
    })?;

    let timestamp = values
        .timestamp
        .or(record.timestamp)
        .ok_or_else(|| MarketDataError::data(PROVIDER_ID, "quote has no timestamp"))?;

    Ok(QuoteSample {
        timestamp,
        price: decimal_field(values.price, "price", timestamp)?,
        volume_24h: decimal_field(values.volume_24h, "volume_24h", timestamp)?,
    })
}

fn decimal_field(
    value: Option<f64>,
    field: &str,
    at: DateTime<Utc>,
) -> Result<Decimal, MarketDataError> {
    let value = value.ok_or_else(|| {
        MarketDataError::data(PROVIDER_ID, format!("missing {} at {}", field, at))
    })?;
    to_decimal(value).ok_or_else(|| {
        MarketDataError::data(
            PROVIDER_ID,
            format!("{} {} at {} is out of decimal range", field, value, at),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(json: serde_json::Value) -> QuoteRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_to_sample() {
        let r = record(serde_json::json!({
            "timestamp": "2020-06-01T00:04:00.000Z",
            "quote": {"2781": {"price": 9445.83, "volume_24h": 100.5, "timestamp": "2020-06-01T00:04:00.000Z"}}
        }));

        let sample = to_sample(&r, AssetId(2781)).unwrap();
        assert_eq!(sample.price, dec!(9445.83));
        assert_eq!(sample.volume_24h, dec!(100.5));
        assert_eq!(sample.timestamp.to_rfc3339(), "2020-06-01T00:04:00+00:00");
    }

    #[test]
    fn test_to_sample_falls_back_to_record_timestamp() {
        let r = record(serde_json::json!({
            "timestamp": "2020-06-01T00:09:00.000Z",
            "quote": {"2781": {"price": 1.0, "volume_24h": 2.0}}
        }));
        let sample = to_sample(&r, AssetId(2781)).unwrap();
        assert_eq!(sample.timestamp.to_rfc3339(), "2020-06-01T00:09:00+00:00");
    }

    #[test]
    fn test_to_sample_wrong_convert_block() {
        let r = record(serde_json::json!({
            "timestamp": "2020-06-01T00:04:00.000Z",
            "quote": {"2790": {"price": 1.0, "volume_24h": 2.0}}
        }));
        let err = to_sample(&r, AssetId(2781)).unwrap_err();
        assert!(matches!(err, MarketDataError::DataError { .. }));
    }

    #[test]
    fn test_to_sample_out_of_range_price() {
        let r = record(serde_json::json!({
            "timestamp": "2020-06-01T00:04:00.000Z",
            "quote": {"2781": {"price": 1e30, "volume_24h": 2.0}}
        }));
        let err = to_sample(&r, AssetId(2781)).unwrap_err();
        match err {
            MarketDataError::DataError { message, .. } => {
                assert!(message.contains("out of decimal range"), "{}", message);
                assert!(message.starts_with("price"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_window_end() {
        let start = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            window_end(start, Timeframe::FiveMinutes, 2),
            Utc.with_ymd_and_hms(2020, 6, 1, 0, 10, 0).unwrap()
        );
        assert_eq!(
            window_end(start, Timeframe::OneDay, u32::MAX),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_to_sample_null_price() {
        let r = record(serde_json::json!({
            "timestamp": "2020-06-01T00:04:00.000Z",
            "quote": {"2781": {"price": null, "volume_24h": 2.0}}
        }));
        let err = to_sample(&r, AssetId(2781)).unwrap_err();
        assert!(matches!(err, MarketDataError::DataError { .. }));
    }
}
