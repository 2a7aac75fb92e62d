//! Reduction of a quote window into a single OHLCV bar.

use chrono::Duration;

use crate::models::{HistoricalBar, QuoteWindow};

/// Collapse a [`QuoteWindow`] into a [`HistoricalBar`].
///
/// - open / close: first and last sample price
/// - high / low: extremes over every sample in the window
/// - volume: growth of the rolling 24h volume between first and last sample.
///   This approximates what traded inside the window; it can be negative when
///   the 24h figure shrinks.
/// - duration: `interval * (samples - 1)`
pub fn normalize(window: &QuoteWindow) -> HistoricalBar {
    let first = window.first();
    let last = window.last();

    let (high, low) = window
        .samples()
        .iter()
        .fold((first.price, first.price), |(high, low), s| {
            (high.max(s.price), low.min(s.price))
        });

    let duration = i32::try_from(window.len() - 1)
        .ok()
        .and_then(|steps| window.interval().duration().checked_mul(steps))
        .unwrap_or(Duration::MAX);

    HistoricalBar {
        duration,
        timestamp: window.start(),
        open: first.price,
        high,
        low,
        close: last.price,
        volume: last.volume_24h - first.volume_24h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuoteSample, Timeframe};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap()
    }

    fn window(points: &[(Decimal, Decimal)]) -> QuoteWindow {
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, (price, volume))| QuoteSample {
                timestamp: start() + Duration::minutes(5 * i as i64),
                price: *price,
                volume_24h: *volume,
            })
            .collect();
        QuoteWindow::new(start(), Timeframe::FiveMinutes, samples).unwrap()
    }

    #[test]
    fn test_two_sample_window() {
        let bar = normalize(&window(&[
            (dec!(9445.83), dec!(27000000000.50)),
            (dec!(9435.80), dec!(27000001000.75)),
        ]));

        assert_eq!(bar.open, dec!(9445.83));
        assert_eq!(bar.close, dec!(9435.80));
        assert_eq!(bar.high, dec!(9445.83));
        assert_eq!(bar.low, dec!(9435.80));
        assert_eq!(bar.volume, dec!(1000.25));
        assert_eq!(bar.duration, Duration::minutes(5));
        assert_eq!(bar.timestamp, start());
    }

    #[test]
    fn test_high_low_span_whole_window() {
        let bar = normalize(&window(&[
            (dec!(100), dec!(10)),
            (dec!(140), dec!(11)),
            (dec!(80), dec!(12)),
            (dec!(110), dec!(15)),
        ]));

        assert_eq!(bar.open, dec!(100));
        assert_eq!(bar.close, dec!(110));
        assert_eq!(bar.high, dec!(140));
        assert_eq!(bar.low, dec!(80));
        assert_eq!(bar.volume, dec!(5));
        assert_eq!(bar.duration, Duration::minutes(15));
    }

    #[test]
    fn test_ohlc_invariants_and_determinism() {
        let cases: [&[(Decimal, Decimal)]; 3] = [
            &[(dec!(1), dec!(0)), (dec!(1), dec!(0))],
            &[(dec!(2.5), dec!(3)), (dec!(0.1), dec!(1))],
            &[(dec!(7), dec!(0)), (dec!(9), dec!(0)), (dec!(8), dec!(0))],
        ];

        for points in cases {
            let w = window(points);
            let bar = normalize(&w);
            assert_eq!(bar, normalize(&w));
            assert!(bar.high >= bar.low);
            assert!(bar.high >= bar.open && bar.high >= bar.close);
            assert!(bar.low <= bar.open && bar.low <= bar.close);
        }
    }

    #[test]
    fn test_shrinking_24h_volume_gives_negative_volume() {
        let bar = normalize(&window(&[(dec!(1), dec!(50)), (dec!(1), dec!(45))]));
        assert_eq!(bar.volume, dec!(-5));
    }
}
