//! Market data models
//!
//! - `types` - Identifiers and enums (AssetId, AssetRef, AssetClass, Timeframe)
//! - `quote` - Provider quote samples and the ordered window they form
//! - `bar` - The normalized bar and the host cache key

mod bar;
mod quote;
mod types;

pub use bar::{AssetPairAndTimestamp, HistoricalBar};
pub use quote::{QuoteSample, QuoteWindow};
pub use types::{AssetClass, AssetId, AssetRef, Timeframe};
