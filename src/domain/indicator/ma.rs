//! Simple moving average of closing prices.
//!
//! MA(n)[i] = mean(C[i-n+1..=i]); the first (n-1) positions are NaN.

use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::rolling_mean;

pub fn calculate_ma(bars: &[OhlcvBar], period: usize) -> Vec<f64> {
    rolling_mean(&closes(bars), period)
}
