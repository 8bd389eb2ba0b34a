//! OBV (On-Balance Volume).
//!
//! OBV[0] = 0
//! OBV[i] = OBV[i-1] + sign(close[i] - close[i-1]) × volume[i]
//!
//! An unchanged close contributes nothing.

use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_obv(bars: &[OhlcvBar]) -> Vec<f64> {
    let mut result = Vec::with_capacity(bars.len());
    let mut obv = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                obv += bar.volume;
            } else if bar.close < prev_close {
                obv -= bar.volume;
            }
        }
        result.push(obv);
    }

    result
}
