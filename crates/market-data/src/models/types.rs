use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Provider-specific numeric identifier of a traded asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// An asset as the caller knows it: either a ticker or an id already
/// resolved against the provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssetRef {
    Symbol(String),
    Id(AssetId),
}

impl From<&str> for AssetRef {
    fn from(symbol: &str) -> Self {
        Self::Symbol(symbol.to_string())
    }
}

impl From<String> for AssetRef {
    fn from(symbol: String) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<AssetId> for AssetRef {
    fn from(id: AssetId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => f.write_str(symbol),
            Self::Id(id) => write!(f, "#{}", id),
        }
    }
}

/// Namespace a symbol is resolved in.
///
/// Providers keep cryptocurrencies and fiat currencies in separate id maps,
/// and the same ticker can mean different things in each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Crypto,
    Fiat,
}

/// Sampling interval / candle width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Timeframe {
    /// Finest to coarsest.
    pub const LADDER: [Timeframe; 6] = [
        Timeframe::OneMinute,
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
    ];

    /// Interval string understood by the providers (`"5m"`, `"1h"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::OneMinute => Duration::minutes(1),
            Self::FiveMinutes => Duration::minutes(5),
            Self::FifteenMinutes => Duration::minutes(15),
            Self::OneHour => Duration::hours(1),
            Self::FourHours => Duration::hours(4),
            Self::OneDay => Duration::days(1),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_strings() {
        let strings: Vec<&str> = Timeframe::LADDER.iter().map(|t| t.as_str()).collect();
        assert_eq!(strings, vec!["1m", "5m", "15m", "1h", "4h", "1d"]);
    }

    #[test]
    fn test_ladder_is_increasing() {
        for pair in Timeframe::LADDER.windows(2) {
            assert!(pair[0].duration() < pair[1].duration());
        }
    }

    #[test]
    fn test_asset_ref_display() {
        assert_eq!(AssetRef::from("BTC").to_string(), "BTC");
        assert_eq!(AssetRef::from(AssetId(2781)).to_string(), "#2781");
    }
}
