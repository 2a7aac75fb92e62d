//! CoinMarketCap API response models.
//!
//! Every response is wrapped in the same envelope: a `status` block carrying
//! the provider error code, and a `data` block whose shape depends on the
//! endpoint (and, for the id map, on the mood of the server).

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::models::AssetId;

/// Response envelope shared by all endpoints.
///
/// `data` is kept untyped until the status has been checked, so error
/// responses never fail on data parsing.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Status block
#[derive(Debug, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Status {
    pub fn message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "no error message".to_string())
    }
}

/// Candidate record from `/v1/cryptocurrency/map` or `/v1/fiat/map`.
///
/// Fiat records carry no rank.
#[derive(Clone, Debug, Deserialize)]
pub struct MapRecord {
    pub id: u64,
    pub symbol: String,
    #[serde(default)]
    pub rank: Option<u64>,
}

/// The id map `data` block.
///
/// Usually a flat list, but some responses group the candidates by symbol.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MapData {
    List(Vec<MapRecord>),
    BySymbol(BTreeMap<String, Vec<MapRecord>>),
}

impl MapData {
    /// Flatten to candidates ordered by rank (unranked last).
    pub fn into_ranked(self) -> Vec<MapRecord> {
        let mut candidates = match self {
            Self::List(records) => records,
            Self::BySymbol(groups) => groups.into_values().flatten().collect(),
        };
        candidates.sort_by_key(|c| c.rank.unwrap_or(u64::MAX));
        candidates
    }
}

/// The `/v2/cryptocurrency/quotes/historical` `data` block.
///
/// v2 keys the payload by asset id; the flat variant is what v1 (and some
/// sandbox deployments) return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoricalData {
    ById(HashMap<String, AssetQuotes>),
    Flat(AssetQuotes),
}

impl HistoricalData {
    /// Quotes of asset `id`, or `None` when the payload is for another asset.
    pub fn into_quotes(self, id: AssetId) -> Option<Vec<QuoteRecord>> {
        match self {
            Self::ById(mut by_id) => by_id.remove(&id.to_string()).map(|a| a.quotes),
            Self::Flat(asset) => match asset.id {
                Some(other) if other != id.0 => {
                    warn!("Historical quotes are for id {}, expected {}", other, id);
                    None
                }
                _ => Some(asset.quotes),
            },
        }
    }
}

/// `quotes` is required so that a mistyped id-keyed payload can't fall
/// through to the flat variant as an empty asset.
#[derive(Debug, Deserialize)]
pub struct AssetQuotes {
    #[serde(default)]
    pub id: Option<u64>,
    pub quotes: Vec<QuoteRecord>,
}

/// One historical sample; `quote` is keyed by the convert id.
#[derive(Debug, Deserialize)]
pub struct QuoteRecord {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quote: HashMap<String, QuoteValues>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteValues {
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Convert a JSON float to a decimal through its shortest round-trip text,
/// so `9445.83` stays `9445.83`.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}
