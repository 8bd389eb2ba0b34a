//! Dispatch from an [`IndicatorType`] key to its calculation.

use crate::domain::indicator::{
    calculate_atr, calculate_boll, calculate_ema, calculate_kdj, calculate_ma, calculate_macd,
    calculate_obv, calculate_rsi, IndicatorOutput, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::HashMap;

pub fn compute_indicator(bars: &[OhlcvBar], indicator_type: IndicatorType) -> IndicatorSeries {
    let output = match indicator_type {
        IndicatorType::Ma { period } => IndicatorOutput::Line {
            values: calculate_ma(bars, period),
        },
        IndicatorType::Ema { period } => IndicatorOutput::Line {
            values: calculate_ema(bars, period),
        },
        IndicatorType::Rsi { period } => IndicatorOutput::Line {
            values: calculate_rsi(bars, period),
        },
        IndicatorType::Atr { period } => IndicatorOutput::Line {
            values: calculate_atr(bars, period),
        },
        IndicatorType::Obv => IndicatorOutput::Line {
            values: calculate_obv(bars),
        },
        IndicatorType::Macd { fast, slow, signal } => {
            IndicatorOutput::Macd(calculate_macd(bars, fast, slow, signal))
        }
        IndicatorType::Kdj { n, m1, m2 } => IndicatorOutput::Kdj(calculate_kdj(bars, n, m1, m2)),
        IndicatorType::Boll { period, k_x100 } => {
            IndicatorOutput::Boll(calculate_boll(bars, period, k_x100 as f64 / 100.0))
        }
    };

    IndicatorSeries {
        indicator_type,
        output,
    }
}

/// Compute every requested indicator once. Duplicate keys collapse.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut out = HashMap::with_capacity(types.len());
    for &t in types {
        out.entry(t).or_insert_with(|| compute_indicator(bars, t));
    }
    out
}
