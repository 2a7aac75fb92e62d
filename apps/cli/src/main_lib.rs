use anyhow::Context;
use barfeed_market_data::{
    binance_converter, BinanceConfig, CoinMarketCapConfig, CoinMarketCapConverter, PairConverter,
};
use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Price sources selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Coinmarketcap,
    Binance,
}

const LOG_FORMAT_VAR: &str = "BARFEED_LOG_FORMAT";

/// Log output selected by `BARFEED_LOG_FORMAT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_VAR).ok().as_deref())
    }

    /// Anything but `json` (any case) falls back to text.
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` filters, defaulting to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// Build the converter for `provider` from the process environment.
pub fn build_converter(provider: Provider) -> anyhow::Result<Box<dyn PairConverter>> {
    let converter: Box<dyn PairConverter> = match provider {
        Provider::Coinmarketcap => {
            let config = CoinMarketCapConfig::from_env()
                .context("invalid CoinMarketCap configuration")?;
            if config.is_sandbox() {
                tracing::warn!("No CoinMarketCap API key set, using the sandbox (no real prices)");
            }
            Box::new(CoinMarketCapConverter::new(config)?)
        }
        Provider::Binance => {
            let config = BinanceConfig::from_env().context("invalid Binance configuration")?;
            Box::new(binance_converter(config)?)
        }
    };
    Ok(converter)
}
