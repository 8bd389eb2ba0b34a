//! Bollinger Bands.
//!
//! - Middle: MA(n) of closes
//! - Upper/Lower: Middle ± k × sample StdDev(n)
//! - Bandwidth: (Upper - Lower) / Middle × 100
//! - %B: (Close - Lower) / (Upper - Lower) × 100, unbounded when price leaves the bands
//!
//! Default parameters: period=20, k=2.0
//! Warmup: first (period-1) bars are NaN.
//!
//! A zero-width band (constant window) reports %B = 50; a zero middle reports
//! bandwidth 0.

use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::{rolling_mean, rolling_std};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollResult {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
    pub bandwidth: Vec<f64>,
    pub percent_b: Vec<f64>,
}

pub fn calculate_boll(bars: &[OhlcvBar], period: usize, k: f64) -> BollResult {
    let close = closes(bars);
    let middle = rolling_mean(&close, period);
    let std = rolling_std(&close, period);

    let n = close.len();
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut bandwidth = Vec::with_capacity(n);
    let mut percent_b = Vec::with_capacity(n);

    for i in 0..n {
        let band = k * std[i];
        let up = middle[i] + band;
        let lo = middle[i] - band;
        let width = up - lo;

        upper.push(up);
        lower.push(lo);
        bandwidth.push(if middle[i] == 0.0 {
            0.0
        } else {
            width / middle[i] * 100.0
        });
        percent_b.push(if width == 0.0 {
            50.0
        } else {
            (close[i] - lo) / width * 100.0
        });
    }

    BollResult {
        upper,
        middle,
        lower,
        bandwidth,
        percent_b,
    }
}

pub fn calculate_boll_default(bars: &[OhlcvBar]) -> BollResult {
    calculate_boll(bars, DEFAULT_PERIOD, DEFAULT_K)
}
