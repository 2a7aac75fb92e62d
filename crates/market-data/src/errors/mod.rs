//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all bar lookups
//! - [`ErrorKind`]: The three-way taxonomy (not found / server / data)
//! - [`RetryClass`]: Advice to the host on how to react

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching historical bars.
///
/// Absence of data is *not* an error: converters return `Ok(None)` when a
/// source symbol is unknown or a window has no quotes. Everything here is a
/// failure the host has to decide about.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider has no asset matching the symbol.
    #[error("Symbol not found: {symbol} ({provider})")]
    SymbolNotFound {
        /// The provider that was asked
        provider: String,
        /// The symbol as given by the caller
        symbol: String,
    },

    /// The provider answered with a non-zero status code.
    #[error("Server error: {provider} - {code}: {message}")]
    ServerError {
        /// The provider that returned the error
        provider: String,
        /// Provider status code (or HTTP status when no status block was sent)
        code: i64,
        /// The error message from the provider
        message: String,
    },

    /// The request could not be completed.
    #[error("Network error: {provider}")]
    Network {
        /// The provider that was being called
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response did not have the expected shape.
    #[error("Data error: {provider} - {message}")]
    DataError {
        /// The provider that returned the data
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// The response body was not valid JSON for the expected schema.
    #[error("Failed to parse response from {provider}")]
    Parse {
        /// The provider that returned the body
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse taxonomy of [`MarketDataError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Asset or symbol unknown to the provider.
    NotFound,
    /// Connectivity failure or non-zero provider status.
    Server,
    /// Malformed or unexpected response shape.
    Data,
}

impl MarketDataError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SymbolNotFound { .. } => ErrorKind::NotFound,
            Self::ServerError { .. } | Self::Network { .. } => ErrorKind::Server,
            Self::DataError { .. } | Self::Parse { .. } | Self::InvalidConfig(_) => {
                ErrorKind::Data
            }
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use barfeed_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::SymbolNotFound {
    ///     provider: "coinmarketcap.com".to_string(),
    ///     symbol: "XYZ".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self.kind() {
            ErrorKind::NotFound => RetryClass::NextProvider,
            ErrorKind::Server => RetryClass::WithBackoff,
            ErrorKind::Data => RetryClass::Never,
        }
    }

    pub(crate) fn not_found(provider: &str, symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            provider: provider.to_string(),
            symbol: symbol.into(),
        }
    }

    pub(crate) fn data(provider: &str, message: impl Into<String>) -> Self {
        Self::DataError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_tries_next_provider() {
        let error = MarketDataError::not_found("coinmarketcap.com", "XYZ");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_server_error_retries_with_backoff() {
        let error = MarketDataError::ServerError {
            provider: "coinmarketcap.com".to_string(),
            code: 1008,
            message: "You've exceeded your API Key's HTTP request rate limit.".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_data_errors_never_retry() {
        let error = MarketDataError::data("coinmarketcap.com", "missing quote block");
        assert_eq!(error.retry_class(), RetryClass::Never);

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = MarketDataError::Parse {
            provider: "Binance.com".to_string(),
            source: parse,
        };
        assert_eq!(error.kind(), ErrorKind::Data);
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_invalid_config_is_data_kind() {
        let error = MarketDataError::InvalidConfig("bad timeout".to_string());
        assert_eq!(error.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::not_found("coinmarketcap.com", "EUR");
        assert_eq!(
            format!("{}", error),
            "Symbol not found: EUR (coinmarketcap.com)"
        );

        let error = MarketDataError::ServerError {
            provider: "coinmarketcap.com".to_string(),
            code: 1002,
            message: "API key missing.".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Server error: coinmarketcap.com - 1002: API key missing."
        );
    }
}
