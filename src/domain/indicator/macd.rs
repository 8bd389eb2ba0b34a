//! MACD (Moving Average Convergence Divergence).
//!
//! DIF = EMA(fast) - EMA(slow)
//! DEA = EMA(signal) of DIF
//! Histogram = 2 × (DIF - DEA)
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The EMAs seed from the first observation, so there is no NaN prefix.

use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::ewm_mean;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdResult {
    macd_values(&closes(bars), fast, slow, signal_period)
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> MacdResult {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

pub fn macd_values(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdResult {
    let ema_fast = ewm_mean(values, fast);
    let ema_slow = ewm_mean(values, slow);

    let dif: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let dea = ewm_mean(&dif, signal_period);
    let histogram = dif
        .iter()
        .zip(dea.iter())
        .map(|(d, e)| 2.0 * (d - e))
        .collect();

    MacdResult {
        dif,
        dea,
        histogram,
    }
}

impl MacdResult {
    /// Number of golden (DIF crosses above DEA) and death crosses across the series.
    pub fn cross_counts(&self) -> (usize, usize) {
        let mut golden = 0;
        let mut death = 0;
        for i in 1..self.dif.len() {
            let (d0, e0) = (self.dif[i - 1], self.dea[i - 1]);
            let (d1, e1) = (self.dif[i], self.dea[i]);
            if d1 > e1 && d0 <= e0 {
                golden += 1;
            } else if d1 < e1 && d0 >= e0 {
                death += 1;
            }
        }
        (golden, death)
    }
}
