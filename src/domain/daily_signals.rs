//! Daily buy and sell signal scorers.
//!
//! Each check that fires adds a fixed number of points; the total is clamped
//! to [0, 100] and mapped to a recommendation band.

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{
    calculate_boll_default, calculate_ema, calculate_kdj_default, calculate_ma,
    calculate_macd_default, rsi_values,
};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};
use crate::domain::pattern::{detect_bullish_candle, detect_macd_divergence_over, Divergence, DivergenceStrength};
use crate::domain::series::{last, nth_back, rolling_mean, round_to};
use crate::domain::signal::{volume_ratio, Signal};
use serde::Serialize;

pub const MIN_BUY_BARS: usize = 60;
pub const MIN_SELL_BARS: usize = 30;

pub const STOP_LOSS_FACTOR: f64 = 0.96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Strong,
    Moderate,
    Watch,
    Wait,
}

impl Recommendation {
    pub fn for_strength(strength: i32) -> Self {
        if strength >= 70 {
            Recommendation::Strong
        } else if strength >= 50 {
            Recommendation::Moderate
        } else if strength >= 30 {
            Recommendation::Watch
        } else {
            Recommendation::Wait
        }
    }

    pub fn buy_advice(self) -> &'static str {
        match self {
            Recommendation::Strong => "strong buy signal; consider building a 40% position",
            Recommendation::Moderate => "fairly strong buy signal; consider a light probing position",
            Recommendation::Watch => "mixed signals; keep watching",
            Recommendation::Wait => "not enough buy signals; keep waiting",
        }
    }

    pub fn sell_advice(self) -> &'static str {
        match self {
            Recommendation::Strong => "strong sell signal; take profits in batches",
            Recommendation::Moderate => "fairly strong sell signal; consider reducing",
            Recommendation::Watch => "mixed signals; set a trailing take-profit",
            Recommendation::Wait => "not enough sell signals; keep holding",
        }
    }
}

/// Weekly levels the daily buy check measures proximity against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuyContext {
    pub weekly_support: Option<f64>,
    pub weekly_ma20: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SellContext {
    pub entry_price: Option<f64>,
    pub weekly_resistance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyIndicators {
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub ema50: f64,
    pub macd_dif: f64,
    pub macd_dea: f64,
    pub kdj_k: f64,
    pub kdj_d: f64,
    pub kdj_j: f64,
    pub rsi_14: f64,
    pub boll_lower: f64,
    pub percent_b: f64,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuySignals {
    pub signal_strength: i32,
    pub signals: Vec<Signal>,
    pub recommendation: Recommendation,
    pub advice: &'static str,
    pub indicators: BuyIndicators,
    pub divergence: Divergence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellIndicators {
    pub ma5: f64,
    pub ma10: f64,
    pub macd_dif: f64,
    pub macd_dea: f64,
    pub kdj_k: f64,
    pub kdj_d: f64,
    pub kdj_j: f64,
    pub rsi_14: f64,
    pub percent_b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellSignals {
    pub signal_strength: i32,
    pub signals: Vec<Signal>,
    pub recommendation: Recommendation,
    pub advice: &'static str,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub divergence: Divergence,
    pub indicators: SellIndicators,
}

/// Latest and previous values of the oscillators both scorers read.
struct Momentum {
    dif: f64,
    dea: f64,
    prev_dif: f64,
    prev_dea: f64,
    k: f64,
    d: f64,
    j: f64,
    prev_k: f64,
    prev_d: f64,
    rsi_14: f64,
}

impl Momentum {
    fn read(bars: &[OhlcvBar]) -> Self {
        let macd = calculate_macd_default(bars);
        let kdj = calculate_kdj_default(bars);
        Self {
            dif: last(&macd.dif),
            dea: last(&macd.dea),
            prev_dif: nth_back(&macd.dif, 1),
            prev_dea: nth_back(&macd.dea, 1),
            k: last(&kdj.k),
            d: last(&kdj.d),
            j: last(&kdj.j),
            prev_k: nth_back(&kdj.k, 1),
            prev_d: nth_back(&kdj.d, 1),
            rsi_14: last(&rsi_values(&closes(bars), 14)),
        }
    }
}

fn within(price: f64, level: f64, tolerance: f64) -> bool {
    level != 0.0 && ((price - level) / level).abs() < tolerance
}

fn divergence_points(divergence: &Divergence) -> i32 {
    match divergence.strength {
        Some(DivergenceStrength::Strong) => 25,
        _ => 15,
    }
}

pub fn analyze_buy_signals(
    bars: &[OhlcvBar],
    ctx: &BuyContext,
    divergence_lookback: usize,
) -> Result<BuySignals, AnalysisError> {
    AnalysisError::require(bars.len(), MIN_BUY_BARS)?;

    let close = closes(bars);
    let latest = last(&close);
    let ma5 = last(&calculate_ma(bars, 5));
    let ma10 = last(&calculate_ma(bars, 10));
    let ma20 = last(&calculate_ma(bars, 20));
    let ma60 = last(&calculate_ma(bars, 60));
    let ema50 = last(&calculate_ema(bars, 50));
    let m = Momentum::read(bars);

    let boll = calculate_boll_default(bars);
    let boll_lower = last(&boll.lower);
    let percent_b = last(&boll.percent_b);

    let vol = volumes(bars);
    let ratio = volume_ratio(last(&vol), last(&rolling_mean(&vol, 5)));

    let mut signals = Vec::new();

    if let Some(support) = ctx.weekly_support.filter(|s| *s > 0.0) {
        if within(latest, support, 0.02) {
            signals.push(Signal::bullish(
                format!("price near weekly support {:.4}", support),
                20,
            ));
        }
    }
    if let Some(wma20) = ctx.weekly_ma20.filter(|v| *v > 0.0) {
        if within(latest, wma20, 0.02) {
            signals.push(Signal::bullish(
                format!("price pulling back to weekly MA20 ({:.4})", wma20),
                15,
            ));
        }
    }
    if within(latest, ema50, 0.015) {
        signals.push(Signal::bullish(
            format!("price pulling back to daily EMA50 ({:.4})", ema50),
            10,
        ));
    }

    let divergence = detect_macd_divergence_over(bars, divergence_lookback)?;
    if divergence.is_bottom() {
        signals.push(Signal::bullish(
            format!("daily MACD bottom divergence: {}", divergence.description),
            divergence_points(&divergence),
        ));
    }

    if m.dif > m.dea && m.prev_dif <= m.prev_dea {
        signals.push(Signal::bullish("daily MACD golden cross just formed", 15));
    } else if m.dif > m.prev_dif && m.dif < m.dea {
        signals.push(Signal::bullish("daily DIF turning up, golden cross near", 10));
    }

    if m.j < 20.0 {
        signals.push(Signal::bullish(format!("KDJ oversold (J={:.1})", m.j), 10));
    }
    let kdj_golden = m.k > m.d && m.prev_k <= m.prev_d;
    if kdj_golden && m.j < 30.0 {
        signals.push(Signal::bullish("KDJ golden cross in oversold zone", 20));
    } else if kdj_golden {
        signals.push(Signal::bullish("KDJ golden cross", 10));
    }

    if m.rsi_14 < 30.0 {
        signals.push(Signal::bullish(format!("RSI oversold ({:.1})", m.rsi_14), 15));
    } else if m.rsi_14 < 40.0 {
        signals.push(Signal::bullish(format!("RSI weak ({:.1})", m.rsi_14), 5));
    }

    if percent_b < 10.0 {
        signals.push(Signal::bullish(
            format!("price touching lower BOLL band (%B={:.1}%)", percent_b),
            15,
        ));
    } else if percent_b < 20.0 {
        signals.push(Signal::bullish(
            format!("price near lower BOLL band (%B={:.1}%)", percent_b),
            10,
        ));
    }

    if ratio < 0.6 {
        signals.push(Signal::bullish(
            format!("volume sharply contracted (ratio {:.2}), selling exhausted", ratio),
            10,
        ));
    } else if ratio < 0.8 {
        signals.push(Signal::bullish(format!("volume contracted (ratio {:.2})", ratio), 5));
    }

    if let Some(pattern) = detect_bullish_candle(bars) {
        signals.push(Signal::bullish(pattern.description(), 10));
    }

    let strength = signals.iter().map(|s| s.weight).sum::<i32>().clamp(0, 100);
    let recommendation = Recommendation::for_strength(strength);

    Ok(BuySignals {
        signal_strength: strength,
        signals,
        recommendation,
        advice: recommendation.buy_advice(),
        indicators: BuyIndicators {
            ma5,
            ma10,
            ma20,
            ma60,
            ema50,
            macd_dif: m.dif,
            macd_dea: m.dea,
            kdj_k: m.k,
            kdj_d: m.d,
            kdj_j: m.j,
            rsi_14: m.rsi_14,
            boll_lower,
            percent_b,
            volume_ratio: ratio,
        },
        divergence,
    })
}

pub fn analyze_sell_signals(
    bars: &[OhlcvBar],
    ctx: &SellContext,
    divergence_lookback: usize,
) -> Result<SellSignals, AnalysisError> {
    AnalysisError::require(bars.len(), MIN_SELL_BARS)?;

    let latest = last(&closes(bars));
    let ma5 = last(&calculate_ma(bars, 5));
    let ma10 = last(&calculate_ma(bars, 10));
    let m = Momentum::read(bars);
    let percent_b = last(&calculate_boll_default(bars).percent_b);

    let mut signals = Vec::new();

    if let Some(resistance) = ctx.weekly_resistance.filter(|r| *r > 0.0) {
        if latest >= resistance * 0.98 {
            signals.push(Signal::bearish(
                format!("price near weekly resistance {:.4}", resistance),
                20,
            ));
        }
    }

    let divergence = detect_macd_divergence_over(bars, divergence_lookback)?;
    if divergence.is_top() {
        signals.push(Signal::bearish(
            format!("daily MACD top divergence: {}", divergence.description),
            divergence_points(&divergence),
        ));
    }

    if m.dif < m.dea && m.prev_dif >= m.prev_dea {
        signals.push(Signal::bearish("daily MACD death cross formed", 15));
    } else if m.dif < m.prev_dif && m.dif > m.dea {
        signals.push(Signal::bearish("daily DIF turning down", 10));
    }

    if m.j > 80.0 {
        signals.push(Signal::bearish(format!("KDJ overbought (J={:.1})", m.j), 10));
    }
    let kdj_death = m.k < m.d && m.prev_k >= m.prev_d;
    if kdj_death && m.j > 70.0 {
        signals.push(Signal::bearish("KDJ death cross in overbought zone", 20));
    } else if kdj_death {
        signals.push(Signal::bearish("KDJ death cross", 10));
    }

    if m.rsi_14 > 80.0 {
        signals.push(Signal::bearish(format!("RSI severely overbought ({:.1})", m.rsi_14), 15));
    } else if m.rsi_14 > 70.0 {
        signals.push(Signal::bearish(format!("RSI overbought ({:.1})", m.rsi_14), 10));
    }

    if percent_b > 95.0 {
        signals.push(Signal::bearish(
            format!("price touching upper BOLL band (%B={:.1}%)", percent_b),
            15,
        ));
    } else if percent_b > 80.0 {
        signals.push(Signal::bearish(
            format!("price near upper BOLL band (%B={:.1}%)", percent_b),
            10,
        ));
    }

    if latest < ma5 {
        signals.push(Signal::bearish(format!("price below MA5 ({:.4})", ma5), 10));
    }
    if latest < ma10 {
        signals.push(Signal::bearish(format!("price below MA10 ({:.4})", ma10), 10));
    }

    let mut stop_loss = None;
    let mut take_profit = None;
    if let Some(entry) = ctx.entry_price.filter(|e| *e > 0.0) {
        let profit_pct = (latest - entry) / entry * 100.0;
        stop_loss = Some(round_to(entry * STOP_LOSS_FACTOR, 4));

        if profit_pct >= 15.0 {
            let target = round_to(entry * 1.10, 4);
            take_profit = Some(target);
            signals.push(Signal::neutral(format!(
                "profit {:.1}%, raise take-profit to {}",
                profit_pct, target
            )));
        } else if profit_pct >= 10.0 {
            take_profit = Some(entry);
            signals.push(Signal::neutral(format!(
                "profit {:.1}%, raise stop to breakeven",
                profit_pct
            )));
        }
    }

    let strength = signals.iter().map(|s| s.weight).sum::<i32>().clamp(0, 100);
    let recommendation = Recommendation::for_strength(strength);

    Ok(SellSignals {
        signal_strength: strength,
        signals,
        recommendation,
        advice: recommendation.sell_advice(),
        stop_loss,
        take_profit,
        divergence,
        indicators: SellIndicators {
            ma5,
            ma10,
            macd_dif: m.dif,
            macd_dea: m.dea,
            kdj_k: m.k,
            kdj_d: m.d,
            kdj_j: m.j,
            rsi_14: m.rsi_14,
            percent_b,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::DAILY_DIVERGENCE_LOOKBACK;
    use chrono::{Duration, NaiveDate};

    fn make_bars(data: &[(f64, f64)]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(close, volume))| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume,
            })
            .collect()
    }

    fn flat(n: usize) -> Vec<(f64, f64)> {
        vec![(10.0, 1000.0); n]
    }

    #[test]
    fn buy_requires_sixty_bars() {
        let bars = make_bars(&flat(59));
        let err = analyze_buy_signals(&bars, &BuyContext::default(), DAILY_DIVERGENCE_LOOKBACK)
            .unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { have: 59, need: 60 });
    }

    #[test]
    fn sell_requires_thirty_bars() {
        let bars = make_bars(&flat(29));
        assert!(analyze_sell_signals(&bars, &SellContext::default(), DAILY_DIVERGENCE_LOOKBACK).is_err());
    }

    #[test]
    fn buy_position_signals_on_flat_series() {
        let bars = make_bars(&flat(70));
        let ctx = BuyContext {
            weekly_support: Some(10.1),
            weekly_ma20: Some(10.0),
        };
        let result = analyze_buy_signals(&bars, &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        // support 20 + weekly MA20 15 + EMA50 10
        assert_eq!(result.signal_strength, 45);
        assert_eq!(result.signals.len(), 3);
        assert_eq!(result.recommendation, Recommendation::Watch);
        assert_eq!(result.advice, Recommendation::Watch.buy_advice());
    }

    #[test]
    fn buy_ignores_zero_levels() {
        let bars = make_bars(&flat(70));
        let ctx = BuyContext {
            weekly_support: Some(0.0),
            weekly_ma20: None,
        };
        let result = analyze_buy_signals(&bars, &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        assert_eq!(result.signal_strength, 10);
    }

    #[test]
    fn buy_volume_contraction() {
        let mut data = flat(70);
        data[69].1 = 500.0;
        let result =
            analyze_buy_signals(&make_bars(&data), &BuyContext::default(), DAILY_DIVERGENCE_LOOKBACK)
                .unwrap();
        // EMA50 10 + volume ratio 500/900 < 0.6 → 10
        assert_eq!(result.signal_strength, 20);
        assert!(result.indicators.volume_ratio < 0.6);
        assert_eq!(result.recommendation, Recommendation::Wait);
    }

    #[test]
    fn buy_oversold_decline() {
        let data: Vec<(f64, f64)> = (0..80).map(|i| (200.0 - i as f64, 1000.0)).collect();
        let result =
            analyze_buy_signals(&make_bars(&data), &BuyContext::default(), DAILY_DIVERGENCE_LOOKBACK)
                .unwrap();
        // RSI 15 + %B below 10 15 + KDJ J below 20 10, possibly a KDJ cross on top
        assert!(result.signal_strength >= 40);
        assert!(result.signals.iter().any(|s| s.description.starts_with("RSI oversold")));
        assert!(result.signals.iter().any(|s| s.description.starts_with("KDJ oversold")));
        assert!(result.indicators.percent_b < 10.0);
    }

    #[test]
    fn sell_overbought_rise_at_resistance() {
        let data: Vec<(f64, f64)> = (0..60).map(|i| (100.0 + i as f64, 1000.0)).collect();
        let ctx = SellContext {
            entry_price: None,
            weekly_resistance: Some(160.0),
        };
        let result = analyze_sell_signals(&make_bars(&data), &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        // resistance 20 + RSI 15 + %B above 80 10 + J above 80 10
        assert!(result.signal_strength >= 55);
        assert!(result.signals.iter().any(|s| s.description.starts_with("price near weekly resistance")));
        assert!(result.stop_loss.is_none());
        assert!(result.take_profit.is_none());
    }

    #[test]
    fn sell_trailing_take_profit_above_fifteen_percent() {
        let bars = make_bars(&flat(40));
        let ctx = SellContext {
            entry_price: Some(8.5),
            weekly_resistance: None,
        };
        let result = analyze_sell_signals(&bars, &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        assert!((result.stop_loss.unwrap() - 8.16).abs() < 1e-9);
        assert!((result.take_profit.unwrap() - 9.35).abs() < 1e-9);
        // RSI saturates on a flat series
        assert_eq!(result.signal_strength, 15);
        assert_eq!(result.signals.last().unwrap().weight, 0);
    }

    #[test]
    fn sell_breakeven_between_ten_and_fifteen_percent() {
        let bars = make_bars(&flat(40));
        let ctx = SellContext {
            entry_price: Some(9.0),
            weekly_resistance: None,
        };
        let result = analyze_sell_signals(&bars, &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        assert_eq!(result.take_profit, Some(9.0));
    }

    #[test]
    fn sell_no_take_profit_without_gain() {
        let bars = make_bars(&flat(40));
        let ctx = SellContext {
            entry_price: Some(10.0),
            weekly_resistance: None,
        };
        let result = analyze_sell_signals(&bars, &ctx, DAILY_DIVERGENCE_LOOKBACK).unwrap();
        assert!((result.stop_loss.unwrap() - 9.6).abs() < 1e-9);
        assert_eq!(result.take_profit, None);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(Recommendation::for_strength(100), Recommendation::Strong);
        assert_eq!(Recommendation::for_strength(70), Recommendation::Strong);
        assert_eq!(Recommendation::for_strength(69), Recommendation::Moderate);
        assert_eq!(Recommendation::for_strength(30), Recommendation::Watch);
        assert_eq!(Recommendation::for_strength(0), Recommendation::Wait);
    }
}
