//! Pair converter abstractions and implementations.
//!
//! This module contains:
//! - The `PairConverter` trait the host calls on a price-cache miss
//! - `coinmarketcap`: CoinMarketCap historical quotes
//! - `exchange`: candle history straight from exchanges (Binance)
//!
//! Converters never retry and never cache bars; both are host concerns.
//! A converter that simply has no price answers `Ok(None)` so the host can
//! fall back to the next one.

mod traits;

pub mod coinmarketcap;
pub mod exchange;

// Re-exports
pub use traits::{PairConverter, UNKNOWN_EXCHANGE};
