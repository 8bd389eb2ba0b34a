//! Support and resistance levels from local extrema in a trailing window.

use crate::domain::error::AnalysisError;
use crate::domain::ohlcv::{closes, highs, lows, OhlcvBar};
use crate::domain::pattern::{local_highs, local_lows};
use crate::domain::series::{last, rolling_mean, round_to, tail};
use serde::Serialize;

pub const DEFAULT_LOOKBACK: usize = 52;
pub const MAX_LEVELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Levels {
    /// Nearest first (descending).
    pub supports: Vec<f64>,
    /// Nearest first (ascending).
    pub resistances: Vec<f64>,
    pub nearest_support: f64,
    pub nearest_resistance: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub period_high: f64,
    pub period_low: f64,
}

pub fn find_support_resistance(bars: &[OhlcvBar], lookback: usize) -> Result<Levels, AnalysisError> {
    AnalysisError::require(bars.len(), 1)?;
    if lookback == 0 {
        return Err(AnalysisError::Degenerate {
            reason: "support lookback must be positive".to_string(),
        });
    }

    let window = tail(bars, lookback);
    let close = closes(window);
    let high = highs(window);
    let low = lows(window);
    let latest = last(&close);

    let period_high = high.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let period_low = low.iter().copied().fold(f64::INFINITY, f64::min);

    let mut supports: Vec<f64> = local_lows(&low)
        .into_iter()
        .map(|e| e.value)
        .filter(|v| *v < latest)
        .collect();
    supports.sort_by(|a, b| b.total_cmp(a));
    supports.truncate(MAX_LEVELS);

    let mut resistances: Vec<f64> = local_highs(&high)
        .into_iter()
        .map(|e| e.value)
        .filter(|v| *v > latest)
        .collect();
    resistances.sort_by(|a, b| a.total_cmp(b));
    resistances.truncate(MAX_LEVELS);

    if supports.is_empty() {
        supports.push(period_low);
    }
    if resistances.is_empty() {
        resistances.push(period_high);
    }

    let ma20 = last(&rolling_mean(&close, 20));
    let ma60 = if close.len() > 60 {
        last(&rolling_mean(&close, 60.min(close.len() - 1)))
    } else {
        ma20
    };

    Ok(Levels {
        nearest_support: supports[0],
        nearest_resistance: resistances[0],
        supports,
        resistances,
        ma20: round_to(ma20, 4),
        ma60: round_to(ma60, 4),
        period_high: round_to(period_high, 4),
        period_low: round_to(period_low, 4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::weeks(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    /// Zig-zag between 90 and 110 with a 10-bar half cycle.
    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = i % 20;
                if phase <= 10 {
                    90.0 + 2.0 * phase as f64
                } else {
                    110.0 - 2.0 * (phase - 10) as f64
                }
            })
            .collect()
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = find_support_resistance(&[], DEFAULT_LOOKBACK).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { have: 0, need: 1 });
    }

    #[test]
    fn monotonic_series_falls_back_to_window_extremes() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let levels = find_support_resistance(&make_bars(&prices), DEFAULT_LOOKBACK).unwrap();
        assert_eq!(levels.supports, vec![99.0]);
        assert_eq!(levels.resistances, vec![130.0]);
        assert_eq!(levels.nearest_support, 99.0);
        assert_eq!(levels.nearest_resistance, 130.0);
        assert_eq!(levels.period_high, 130.0);
        assert_eq!(levels.period_low, 99.0);
    }

    #[test]
    fn zigzag_levels_are_ordered_nearest_first() {
        let mut prices = zigzag(50);
        // end mid-range so peaks sit above and troughs below
        prices.push(100.0);
        let levels = find_support_resistance(&make_bars(&prices), DEFAULT_LOOKBACK).unwrap();

        assert!(!levels.supports.is_empty() && levels.supports.len() <= MAX_LEVELS);
        assert!(!levels.resistances.is_empty() && levels.resistances.len() <= MAX_LEVELS);
        assert!(levels.supports.iter().all(|s| *s < 100.0));
        assert!(levels.resistances.iter().all(|r| *r > 100.0));
        assert!(levels.supports.windows(2).all(|w| w[0] >= w[1]));
        assert!(levels.resistances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(levels.nearest_support, levels.supports[0]);
        assert_eq!(levels.nearest_resistance, levels.resistances[0]);
        // troughs at 90 have low 89, peaks at 110 have high 111
        assert_eq!(levels.nearest_support, 89.0);
        assert_eq!(levels.nearest_resistance, 111.0);
    }

    #[test]
    fn lookback_limits_window() {
        let mut prices = vec![500.0; 10];
        prices.extend((0..20).map(|i| 100.0 + i as f64));
        let levels = find_support_resistance(&make_bars(&prices), 20).unwrap();
        assert_eq!(levels.period_high, 120.0);
    }

    #[test]
    fn ma60_falls_back_to_ma20_for_short_windows() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let levels = find_support_resistance(&make_bars(&prices), DEFAULT_LOOKBACK).unwrap();
        assert_eq!(levels.ma60, levels.ma20);
        // mean of 120..=139
        assert!((levels.ma20 - 129.5).abs() < 1e-9);
    }

    #[test]
    fn ma60_uses_full_window_when_long_enough() {
        let prices: Vec<f64> = (0..80).map(|i| i as f64).collect();
        let levels = find_support_resistance(&make_bars(&prices), 80).unwrap();
        // mean of 20..=79
        assert!((levels.ma60 - 49.5).abs() < 1e-9);
    }
}
