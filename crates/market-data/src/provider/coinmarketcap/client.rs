use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::debug;

use super::config::CoinMarketCapConfig;
use super::models::Envelope;
use super::PROVIDER_ID;
use crate::errors::MarketDataError;

const API_KEY_HEADER: &str = "x-cmc_pro_api_key";

/// Upper bound on how much of an unparsable body ends up in an error message.
const BODY_SNIPPET_LEN: usize = 200;

/// HTTP session against the CoinMarketCap API.
///
/// Holds the connection pool and the fixed default headers (API key, accept).
/// Shared by the symbol resolver and the quote fetcher.
pub struct CoinMarketCapClient {
    http: Client,
    base_url: String,
}

impl CoinMarketCapClient {
    pub fn new(config: &CoinMarketCapConfig) -> Result<Self, MarketDataError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            MarketDataError::InvalidConfig("API key contains invalid header characters".to_string())
        })?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| MarketDataError::Network {
                provider: PROVIDER_ID.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET an endpoint and return its envelope.
    ///
    /// Provider status codes are left for the caller to interpret, since
    /// their meaning differs per endpoint. HTTP failures without a readable
    /// status block become `ServerError` with the HTTP code.
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Envelope, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("CoinMarketCap request: {} {:?}", path, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| MarketDataError::Network {
                provider: PROVIDER_ID.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| MarketDataError::Network {
                provider: PROVIDER_ID.to_string(),
                source,
            })?;

        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => {
                if !status.is_success() && envelope.status.error_code == 0 {
                    return Err(MarketDataError::ServerError {
                        provider: PROVIDER_ID.to_string(),
                        code: i64::from(status.as_u16()),
                        message: envelope.status.message(),
                    });
                }
                Ok(envelope)
            }
            Err(_) if !status.is_success() => Err(MarketDataError::ServerError {
                provider: PROVIDER_ID.to_string(),
                code: i64::from(status.as_u16()),
                message: snippet(&body),
            }),
            Err(source) => Err(MarketDataError::Parse {
                provider: PROVIDER_ID.to_string(),
                source,
            }),
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}
