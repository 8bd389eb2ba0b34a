//! RSI (Relative Strength Index).
//!
//! gains/losses come from close-to-close deltas and are smoothed with Wilder's
//! method (α = 1/n, n observations before the first value):
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! When avg_loss is zero the ratio is unbounded and RSI saturates at 100.
//! Warmup: the first (n-1) positions are NaN.

use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::{diff, wilder_ewm};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Vec<f64> {
    rsi_values(&closes(bars), period)
}

/// RSI over an arbitrary value series.
pub fn rsi_values(values: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(values);
    // The undefined first delta counts as neither gain nor loss.
    let gains: Vec<f64> = delta.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = delta.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gain = wilder_ewm(&gains, period);
    let avg_loss = wilder_ewm(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else if l == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            }
        })
        .collect()
}
