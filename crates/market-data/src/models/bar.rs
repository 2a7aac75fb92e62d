use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized OHLCV bar handed to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalBar {
    /// Time span covered by the bar
    #[serde(with = "duration_seconds")]
    pub duration: Duration,

    /// Start of the bar (UTC)
    pub timestamp: DateTime<Utc>,

    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,

    /// Volume traded within the bar (may be an estimate, see provider docs)
    pub volume: Decimal,
}

/// Key under which the host caches bars.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPairAndTimestamp {
    pub timestamp: DateTime<Utc>,
    pub from_asset: String,
    pub to_asset: String,
    pub exchange: String,
}

impl AssetPairAndTimestamp {
    pub fn new(timestamp: DateTime<Utc>, from_asset: &str, to_asset: &str, exchange: &str) -> Self {
        Self {
            timestamp,
            from_asset: from_asset.to_string(),
            to_asset: to_asset.to_string(),
            exchange: exchange.to_string(),
        }
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Duration::try_seconds(seconds)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {}s", seconds)))
    }
}
