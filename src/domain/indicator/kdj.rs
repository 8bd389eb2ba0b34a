//! KDJ stochastic oscillator.
//!
//! RSV = (close - LLV(low, n)) / (HHV(high, n) - LLV(low, n)) × 100
//! K = EMA(RSV, com = m1 - 1)
//! D = EMA(K, com = m2 - 1)
//! J = 3K - 2D
//!
//! Default parameters: n=9, m1=3, m2=3
//! RSV is NaN for the first (n-1) bars; K and D seed from the first defined RSV.
//! A window with no range (HHV == LLV) reports RSV = 50.

use crate::domain::ohlcv::{highs, lows, OhlcvBar};
use crate::domain::series::{ewm_com, rolling_max, rolling_min};
use serde::{Deserialize, Serialize};

pub const DEFAULT_N: usize = 9;
pub const DEFAULT_M1: usize = 3;
pub const DEFAULT_M2: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdjResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

pub fn calculate_kdj(bars: &[OhlcvBar], n: usize, m1: usize, m2: usize) -> KdjResult {
    let low_min = rolling_min(&lows(bars), n);
    let high_max = rolling_max(&highs(bars), n);

    let rsv: Vec<f64> = bars
        .iter()
        .zip(low_min.iter().zip(high_max.iter()))
        .map(|(bar, (&lo, &hi))| {
            let range = hi - lo;
            if range.is_nan() {
                f64::NAN
            } else if range == 0.0 {
                50.0
            } else {
                (bar.close - lo) / range * 100.0
            }
        })
        .collect();

    let k = ewm_com(&rsv, m1 as f64 - 1.0);
    let d = ewm_com(&k, m2 as f64 - 1.0);
    let j = k
        .iter()
        .zip(d.iter())
        .map(|(k, d)| 3.0 * k - 2.0 * d)
        .collect();

    KdjResult { k, d, j }
}

pub fn calculate_kdj_default(bars: &[OhlcvBar]) -> KdjResult {
    calculate_kdj(bars, DEFAULT_N, DEFAULT_M1, DEFAULT_M2)
}
