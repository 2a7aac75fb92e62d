//! Ticker to CoinMarketCap id resolution.
//!
//! Results are memoized per resolver instance for its whole lifetime.
//! Failures are not cached, so a later call can succeed once the provider
//! learns about the asset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::client::CoinMarketCapClient;
use super::config::ApiMode;
use super::models::{MapData, MapRecord};
use super::PROVIDER_ID;
use crate::errors::MarketDataError;
use crate::models::{AssetClass, AssetId};

const CRYPTO_MAP_PATH: &str = "/v1/cryptocurrency/map";
const FIAT_MAP_PATH: &str = "/v1/fiat/map";

/// Status code the map endpoint uses for an invalid `symbol` value.
const INVALID_VALUE: i64 = 400;

type CacheKey = (AssetClass, String);

/// Resolves tickers to provider ids and remembers the answers.
pub struct SymbolResolver {
    client: Arc<CoinMarketCapClient>,
    mode: ApiMode,
    cache: Mutex<HashMap<CacheKey, AssetId>>,
}

impl SymbolResolver {
    pub fn new(client: Arc<CoinMarketCapClient>, mode: ApiMode) -> Self {
        Self {
            client,
            mode,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `symbol` within one asset class.
    ///
    /// # Errors
    /// * `SymbolNotFound` - no candidate matches
    /// * `ServerError` / `Network` - the lookup could not be completed
    /// * `DataError` / `Parse` - the response had an unexpected shape
    pub async fn resolve(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<AssetId, MarketDataError> {
        let key = (class, symbol.to_uppercase());

        if let Some(id) = self.cached(&key) {
            debug!("Id cache hit: {:?} {} -> {}", class, symbol, id);
            return Ok(id);
        }

        let candidates = match class {
            AssetClass::Crypto => self.crypto_candidates(&key.1).await?,
            AssetClass::Fiat => self.fiat_candidates().await?,
        };

        let id = select_candidate(&candidates, &key.1, self.mode)
            .ok_or_else(|| MarketDataError::not_found(PROVIDER_ID, symbol))?;

        debug!("Resolved {:?} {} -> {}", class, symbol, id);
        let mut cache = self.lock_cache();
        // The fiat map is the full list; keep all of it. Sandbox symbols are
        // placeholders, so there only the requested one is stored.
        if class == AssetClass::Fiat && self.mode == ApiMode::Production {
            for record in &candidates {
                cache
                    .entry((AssetClass::Fiat, record.symbol.to_uppercase()))
                    .or_insert(AssetId(record.id));
            }
        }
        cache.insert(key, id);
        Ok(id)
    }

    /// Resolve a quote currency: cryptocurrencies first, then fiat.
    pub async fn resolve_convert(&self, symbol: &str) -> Result<AssetId, MarketDataError> {
        let upper = symbol.to_uppercase();
        for class in [AssetClass::Crypto, AssetClass::Fiat] {
            if let Some(id) = self.cached(&(class, upper.clone())) {
                debug!("Id cache hit: {:?} {} -> {}", class, symbol, id);
                return Ok(id);
            }
        }

        match self.resolve(symbol, AssetClass::Crypto).await {
            Err(MarketDataError::SymbolNotFound { .. }) => {
                self.resolve(symbol, AssetClass::Fiat).await
            }
            other => other,
        }
    }

    /// Number of memoized ids.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn cached(&self, key: &CacheKey) -> Option<AssetId> {
        self.lock_cache().get(key).copied()
    }

    /// Lock the cache, recovering from poison. The map is only ever
    /// inserted into, so a poisoned guard still holds valid entries.
    fn lock_cache(&self) -> MutexGuard<'_, HashMap<CacheKey, AssetId>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            warn!("Id cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    async fn crypto_candidates(&self, symbol: &str) -> Result<Vec<MapRecord>, MarketDataError> {
        let params = [("symbol", symbol.to_string())];
        let envelope = self.client.get(CRYPTO_MAP_PATH, &params).await?;

        match envelope.status.error_code {
            0 => {}
            INVALID_VALUE => {
                debug!("Map lookup rejected {}: {}", symbol, envelope.status.message());
                return Err(MarketDataError::not_found(PROVIDER_ID, symbol));
            }
            code => {
                return Err(MarketDataError::ServerError {
                    provider: PROVIDER_ID.to_string(),
                    code,
                    message: envelope.status.message(),
                })
            }
        }

        parse_candidates(envelope.data)
    }

    async fn fiat_candidates(&self) -> Result<Vec<MapRecord>, MarketDataError> {
        let envelope = self.client.get(FIAT_MAP_PATH, &[]).await?;

        if envelope.status.error_code != 0 {
            return Err(MarketDataError::ServerError {
                provider: PROVIDER_ID.to_string(),
                code: envelope.status.error_code,
                message: envelope.status.message(),
            });
        }

        parse_candidates(envelope.data)
    }
}

fn parse_candidates(data: serde_json::Value) -> Result<Vec<MapRecord>, MarketDataError> {
    if data.is_null() {
        return Ok(Vec::new());
    }
    let data: MapData = serde_json::from_value(data).map_err(|source| MarketDataError::Parse {
        provider: PROVIDER_ID.to_string(),
        source,
    })?;
    if matches!(data, MapData::BySymbol(_)) {
        warn!("Id map returned candidates grouped by symbol");
    }
    Ok(data.into_ranked())
}

/// Pick the id for `symbol` from rank-ordered candidates.
///
/// Sandbox responses don't echo real symbols, so there the best-ranked
/// candidate wins regardless of its symbol.
pub(crate) fn select_candidate(
    candidates: &[MapRecord],
    symbol: &str,
    mode: ApiMode,
) -> Option<AssetId> {
    match mode {
        ApiMode::Sandbox => candidates.first(),
        ApiMode::Production => candidates
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol)),
    }
    .map(|c| AssetId(c.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, symbol: &str, rank: Option<u64>) -> MapRecord {
        MapRecord {
            id,
            symbol: symbol.to_string(),
            rank,
        }
    }

    #[test]
    fn test_select_first_matching_symbol() {
        let candidates = vec![
            record(7, "BTCB", Some(1)),
            record(1, "btc", Some(2)),
            record(3, "BTC", Some(900)),
        ];
        assert_eq!(
            select_candidate(&candidates, "BTC", ApiMode::Production),
            Some(AssetId(1))
        );
    }

    #[test]
    fn test_select_no_match() {
        let candidates = vec![record(7, "BTCB", Some(1))];
        assert_eq!(select_candidate(&candidates, "BTC", ApiMode::Production), None);
        assert_eq!(select_candidate(&[], "BTC", ApiMode::Production), None);
    }

    #[test]
    fn test_sandbox_takes_first_ranked() {
        let candidates = vec![record(42, "WXYZ", Some(1)), record(1, "BTC", Some(2))];
        assert_eq!(
            select_candidate(&candidates, "BTC", ApiMode::Sandbox),
            Some(AssetId(42))
        );
        assert_eq!(select_candidate(&[], "BTC", ApiMode::Sandbox), None);
    }

    #[test]
    fn test_parse_candidates_null_data() {
        assert!(parse_candidates(serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_parse_candidates_bad_shape() {
        let result = parse_candidates(serde_json::json!({"id": "not-a-list"}));
        assert!(matches!(result, Err(MarketDataError::Parse { .. })));
    }
}
