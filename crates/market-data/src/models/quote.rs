use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::types::Timeframe;

/// One provider quote sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteSample {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    /// Rolling 24h traded volume as reported at `timestamp`.
    pub volume_24h: Decimal,
}

/// An ordered run of quote samples for one asset pair.
///
/// Always holds at least two samples, ordered by increasing timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteWindow {
    start: DateTime<Utc>,
    interval: Timeframe,
    samples: Vec<QuoteSample>,
}

impl QuoteWindow {
    /// Build a window, or `None` when fewer than two samples are available.
    pub fn new(
        start: DateTime<Utc>,
        interval: Timeframe,
        mut samples: Vec<QuoteSample>,
    ) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }
        samples.sort_by_key(|s| s.timestamp);
        Some(Self {
            start,
            interval,
            samples,
        })
    }

    /// Declared window start (the requested timestamp, not the first sample's).
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn interval(&self) -> Timeframe {
        self.interval
    }

    pub fn samples(&self) -> &[QuoteSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed window.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &QuoteSample {
        &self.samples[0]
    }

    pub fn last(&self) -> &QuoteSample {
        &self.samples[self.samples.len() - 1]
    }
}
