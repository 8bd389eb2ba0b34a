//! ATR (Average True Range).
//!
//! TR[0] = high - low (no previous close)
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR = simple rolling mean of TR over `period` bars.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::rolling_mean;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Vec<f64> {
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.range()
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();
    rolling_mean(&tr, period)
}
