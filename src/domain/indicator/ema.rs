//! Exponential moving average of closing prices.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! There is no warmup: every position has a value.

use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::ewm_mean;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> Vec<f64> {
    ewm_mean(&closes(bars), period)
}
