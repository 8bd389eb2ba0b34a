//! Weekly trend classifier.
//!
//! MA20 (life line) and MA60 (bull/bear divider) on weekly closes place the
//! market in one of seven regimes; MACD confirmation then moves the strength
//! by 15 within [-100, 100].

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{calculate_ma, calculate_macd_default};
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::pattern::{detect_macd_divergence_over, Divergence, DivergenceKind};
use crate::domain::series::{last, nth_back};
use serde::Serialize;

pub const MIN_WEEKLY_TREND_BARS: usize = 60;

/// Slope is measured against the MA value this many bars back.
const SLOPE_OFFSET: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendType {
    StrongBull,
    Bull,
    StrongBear,
    Bear,
    BottomReversing,
    TopPullingBack,
    Ranging,
}

impl TrendType {
    pub fn base_strength(self) -> i32 {
        match self {
            TrendType::StrongBull => 80,
            TrendType::Bull => 60,
            TrendType::StrongBear => -80,
            TrendType::Bear => -60,
            TrendType::BottomReversing => 30,
            TrendType::TopPullingBack => -30,
            TrendType::Ranging => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LongOnly,
    LeanLong,
    StayFlat,
    Reduce,
    Watch,
}

impl Operation {
    pub fn for_strength(strength: i32) -> Self {
        if strength >= 60 {
            Operation::LongOnly
        } else if strength >= 30 {
            Operation::LeanLong
        } else if strength <= -60 {
            Operation::StayFlat
        } else if strength <= -30 {
            Operation::Reduce
        } else {
            Operation::Watch
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Operation::LongOnly => "long only; wait for a daily pullback to buy",
            Operation::LeanLong => "lean long; probe with a light position",
            Operation::StayFlat => "stay flat; wait for the decline to stop",
            Operation::Reduce => "reduce or watch; trade cautiously",
            Operation::Watch => "watch and wait; direction unclear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTrend {
    pub trend_type: TrendType,
    pub trend_strength: i32,
    pub signals: Vec<String>,
    pub operation: Operation,
    pub advice: &'static str,
    pub ma5: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub ma20_slope: f64,
    pub ma60_slope: f64,
    pub price_vs_ma20: f64,
    pub price_vs_ma60: f64,
    pub macd_dif: f64,
    pub macd_dea: f64,
    pub macd_hist: f64,
    pub macd_above_zero: bool,
    pub macd_golden: bool,
    pub divergence: Divergence,
}

/// Percent change of `series` over the last `SLOPE_OFFSET` bars; 0 when the
/// base is zero.
fn slope(series: &[f64]) -> f64 {
    let base = nth_back(series, SLOPE_OFFSET);
    if base == 0.0 {
        0.0
    } else {
        (last(series) - base) / base * 100.0
    }
}

fn distance_pct(price: f64, level: f64) -> f64 {
    if level == 0.0 {
        0.0
    } else {
        (price - level) / level * 100.0
    }
}

pub fn analyze_weekly_trend(
    weekly: &[OhlcvBar],
    divergence_lookback: usize,
) -> Result<WeeklyTrend, AnalysisError> {
    AnalysisError::require(weekly.len(), MIN_WEEKLY_TREND_BARS)?;

    let latest = last(&closes(weekly));
    let ma5_series = calculate_ma(weekly, 5);
    let ma20_series = calculate_ma(weekly, 20);
    let ma60_series = calculate_ma(weekly, 60);
    let (ma5, ma20, ma60) = (last(&ma5_series), last(&ma20_series), last(&ma60_series));
    let ma20_slope = slope(&ma20_series);
    let ma60_slope = slope(&ma60_series);

    let macd = calculate_macd_default(weekly);
    let dif = last(&macd.dif);
    let dea = last(&macd.dea);
    let hist = last(&macd.histogram);

    let above_ma20 = latest > ma20;
    let above_ma60 = latest > ma60;
    let ma20_above_ma60 = ma20 > ma60;

    let mut signals = Vec::new();
    let trend_type = if above_ma20 && above_ma60 && ma20_above_ma60 {
        if ma20_slope > 0.5 && ma60_slope > 0.0 {
            signals.push("price above MA20 and MA60".to_string());
            signals.push("MA20 above MA60, bullish alignment".to_string());
            signals.push(format!("MA20 rising (slope {:.2}%)", ma20_slope));
            TrendType::StrongBull
        } else {
            signals.push("bullish MA alignment".to_string());
            TrendType::Bull
        }
    } else if !above_ma20 && !above_ma60 && !ma20_above_ma60 {
        if ma20_slope < -0.5 && ma60_slope < 0.0 {
            signals.push("price below MA20 and MA60".to_string());
            signals.push("MA20 below MA60, bearish alignment".to_string());
            signals.push(format!("MA20 falling (slope {:.2}%)", ma20_slope));
            TrendType::StrongBear
        } else {
            signals.push("bearish MA alignment".to_string());
            TrendType::Bear
        }
    } else if above_ma20 && !ma20_above_ma60 {
        signals.push("price reclaimed MA20 while MA20 is still below MA60".to_string());
        signals.push("possibly early in a bottom reversal".to_string());
        TrendType::BottomReversing
    } else if !above_ma20 && ma20_above_ma60 {
        signals.push("price broke MA20 while MA20 is still above MA60".to_string());
        signals.push("possibly pulling back from a top".to_string());
        TrendType::TopPullingBack
    } else {
        signals.push("MAs intertwined, direction unclear".to_string());
        TrendType::Ranging
    };

    let macd_above_zero = dif > 0.0;
    let macd_golden = dif > dea;
    let position = if macd_above_zero { "above zero" } else { "below zero" };
    let cross = if macd_golden { "golden cross" } else { "death cross" };

    let mut strength = trend_type.base_strength();
    if dif > 0.0 && dif > dea {
        strength = (strength + 15).min(100);
        signals.push(format!("MACD {} with {}, momentum up", position, cross));
    } else if dif < 0.0 && dif < dea {
        strength = (strength - 15).max(-100);
        signals.push(format!("MACD {} with {}, momentum down", position, cross));
    } else {
        signals.push(format!("MACD {} with {}", position, cross));
    }

    let divergence = detect_macd_divergence_over(weekly, divergence_lookback)?;
    if divergence.kind != DivergenceKind::None {
        signals.push(format!("weekly MACD divergence: {}", divergence.description));
    }

    let operation = Operation::for_strength(strength);
    Ok(WeeklyTrend {
        trend_type,
        trend_strength: strength,
        signals,
        operation,
        advice: operation.advice(),
        ma5,
        ma20,
        ma60,
        ma20_slope,
        ma60_slope,
        price_vs_ma20: distance_pct(latest, ma20),
        price_vs_ma60: distance_pct(latest, ma60),
        macd_dif: dif,
        macd_dea: dea,
        macd_hist: hist,
        macd_above_zero,
        macd_golden,
        divergence,
    })
}
