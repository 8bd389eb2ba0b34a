//! Pattern detection: local extrema, MACD divergence and bullish candlesticks.

use crate::domain::error::AnalysisError;
use crate::domain::indicator::macd_values;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::tail;
use serde::Serialize;

/// Bars needed on each side of a candidate extremum.
const EXTREMUM_RADIUS: usize = 2;

pub const MIN_DIVERGENCE_BARS: usize = 30;
pub const DAILY_DIVERGENCE_LOOKBACK: usize = 20;
pub const WEEKLY_DIVERGENCE_LOOKBACK: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    pub index: usize,
    pub value: f64,
}

/// Positions whose value is strictly greater than the two neighbours on each side.
pub fn local_highs(values: &[f64]) -> Vec<Extremum> {
    local_extrema(values, |center, other| center > other)
}

/// Positions whose value is strictly less than the two neighbours on each side.
pub fn local_lows(values: &[f64]) -> Vec<Extremum> {
    local_extrema(values, |center, other| center < other)
}

fn local_extrema<F>(values: &[f64], beats: F) -> Vec<Extremum>
where
    F: Fn(f64, f64) -> bool,
{
    let r = EXTREMUM_RADIUS;
    if values.len() < 2 * r + 1 {
        return Vec::new();
    }
    (r..values.len() - r)
        .filter(|&i| {
            let v = values[i];
            values[i - r..i]
                .iter()
                .chain(values[i + 1..=i + r].iter())
                .all(|&other| beats(v, other))
        })
        .map(|i| Extremum {
            index: i,
            value: values[i],
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl Timeframe {
    pub fn default_lookback(self) -> usize {
        match self {
            Timeframe::Daily => DAILY_DIVERGENCE_LOOKBACK,
            Timeframe::Weekly => WEEKLY_DIVERGENCE_LOOKBACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    None,
    /// Higher price high with a lower DIF high. Bearish.
    Top,
    /// Lower price low with a higher DIF low. Bullish.
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceStrength {
    Strong,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub kind: DivergenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<DivergenceStrength>,
    pub description: &'static str,
}

impl Divergence {
    pub fn none() -> Self {
        Self {
            kind: DivergenceKind::None,
            strength: None,
            description: "no clear divergence",
        }
    }

    pub fn is_top(&self) -> bool {
        self.kind == DivergenceKind::Top
    }

    pub fn is_bottom(&self) -> bool {
        self.kind == DivergenceKind::Bottom
    }
}

pub fn detect_macd_divergence(
    bars: &[OhlcvBar],
    timeframe: Timeframe,
) -> Result<Divergence, AnalysisError> {
    detect_macd_divergence_over(bars, timeframe.default_lookback())
}

/// Compare the last two closing-price extrema inside the trailing `lookback`
/// bars against the MACD DIF line at the same positions.
pub fn detect_macd_divergence_over(
    bars: &[OhlcvBar],
    lookback: usize,
) -> Result<Divergence, AnalysisError> {
    AnalysisError::require(bars.len(), MIN_DIVERGENCE_BARS)?;

    let close = closes(bars);
    let macd = macd_values(&close, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
    let recent_close = tail(&close, lookback);
    let recent_dif = tail(&macd.dif, lookback);

    let highs = local_highs(recent_close);
    let lows = local_lows(recent_close);
    Ok(classify_divergence(&highs, &lows, recent_dif))
}

fn classify_divergence(highs: &[Extremum], lows: &[Extremum], dif: &[f64]) -> Divergence {
    if let [.., prev, last] = highs {
        let (dif_prev, dif_last) = (dif[prev.index], dif[last.index]);
        if last.value > prev.value && dif_last < dif_prev {
            return Divergence {
                kind: DivergenceKind::Top,
                strength: Some(if dif_last < dif_prev * 0.8 {
                    DivergenceStrength::Strong
                } else {
                    DivergenceStrength::Weak
                }),
                description: "price made a higher high but DIF did not; possible top",
            };
        }
    }

    if let [.., prev, last] = lows {
        let (dif_prev, dif_last) = (dif[prev.index], dif[last.index]);
        if last.value < prev.value && dif_last > dif_prev {
            return Divergence {
                kind: DivergenceKind::Bottom,
                strength: Some(if dif_last > dif_prev * 1.2 {
                    DivergenceStrength::Strong
                } else {
                    DivergenceStrength::Weak
                }),
                description: "price made a lower low but DIF did not; possible bottom",
            };
        }
    }

    Divergence::none()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Hammer,
    BullishEngulfing,
    MorningStar,
}

impl CandlePattern {
    pub fn description(self) -> &'static str {
        match self {
            CandlePattern::Hammer => "hammer; possible bottom reversal",
            CandlePattern::BullishEngulfing => "bullish engulfing",
            CandlePattern::MorningStar => "morning star; reversal signal",
        }
    }
}

/// Check the last three bars for a bullish reversal candle.
///
/// Patterns are tried in the order hammer, bullish engulfing, morning star and
/// the first match is returned.
pub fn detect_bullish_candle(bars: &[OhlcvBar]) -> Option<CandlePattern> {
    let [c1, c2, c3] = tail(bars, 3) else {
        return None;
    };

    if c3.lower_shadow() > c3.body() * 2.0 && c3.upper_shadow() < c3.body() * 0.5 {
        return Some(CandlePattern::Hammer);
    }

    if c2.is_bearish() && c3.is_bullish() && c3.open < c2.close && c3.close > c2.open {
        return Some(CandlePattern::BullishEngulfing);
    }

    let c1_range = c1.range();
    if c1.is_bearish()
        && c1.body() >= c1_range * 0.7
        && c2.body() < c1_range * 0.3
        && c3.is_bullish()
        && c3.close > (c1.open + c1.close) / 2.0
    {
        return Some(CandlePattern::MorningStar);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        OhlcvBar {
            date: start + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i, c, c, c, c))
            .collect()
    }

    #[test]
    fn local_highs_and_lows() {
        let values = [1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.0, 3.0, 4.0];
        let highs = local_highs(&values);
        let lows = local_lows(&values);
        assert_eq!(highs, vec![Extremum { index: 2, value: 5.0 }]);
        assert_eq!(lows, vec![Extremum { index: 5, value: 0.5 }]);
    }

    #[test]
    fn extrema_ignore_edges_and_ties() {
        assert!(local_highs(&[9.0, 1.0, 2.0, 1.0]).is_empty());
        // plateau is not a strict extremum
        assert!(local_highs(&[1.0, 2.0, 3.0, 3.0, 2.0, 1.0]).is_empty());
    }

    #[test]
    fn divergence_requires_thirty_bars() {
        let bars = make_bars(&[100.0; 29]);
        let err = detect_macd_divergence(&bars, Timeframe::Daily).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { have: 29, need: 30 });
    }

    #[test]
    fn monotonic_series_has_no_divergence() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let div = detect_macd_divergence(&make_bars(&prices), Timeframe::Daily).unwrap();
        assert_eq!(div.kind, DivergenceKind::None);
        assert!(div.strength.is_none());
    }

    #[test]
    fn timeframe_lookbacks() {
        assert_eq!(Timeframe::Daily.default_lookback(), 20);
        assert_eq!(Timeframe::Weekly.default_lookback(), 12);
    }

    #[test]
    fn classify_strong_top() {
        let highs = [
            Extremum { index: 3, value: 10.0 },
            Extremum { index: 8, value: 11.0 },
        ];
        let mut dif = vec![0.0; 10];
        dif[3] = 1.0;
        dif[8] = 0.5;
        let div = classify_divergence(&highs, &[], &dif);
        assert!(div.is_top());
        assert_eq!(div.strength, Some(DivergenceStrength::Strong));
    }

    #[test]
    fn classify_weak_top() {
        let highs = [
            Extremum { index: 3, value: 10.0 },
            Extremum { index: 8, value: 11.0 },
        ];
        let mut dif = vec![0.0; 10];
        dif[3] = 1.0;
        dif[8] = 0.9;
        let div = classify_divergence(&highs, &[], &dif);
        assert_eq!(div.strength, Some(DivergenceStrength::Weak));
    }

    #[test]
    fn classify_bottom() {
        let lows = [
            Extremum { index: 2, value: 10.0 },
            Extremum { index: 7, value: 9.0 },
        ];
        let mut dif = vec![0.0; 10];
        dif[2] = 1.0;
        dif[7] = 1.5;
        let div = classify_divergence(&[], &lows, &dif);
        assert!(div.is_bottom());
        assert_eq!(div.strength, Some(DivergenceStrength::Strong));

        dif[7] = 1.1;
        let div = classify_divergence(&[], &lows, &dif);
        assert_eq!(div.strength, Some(DivergenceStrength::Weak));
    }

    #[test]
    fn classify_confirmed_high_is_not_divergence() {
        let highs = [
            Extremum { index: 1, value: 10.0 },
            Extremum { index: 5, value: 11.0 },
        ];
        let mut dif = vec![0.0; 6];
        dif[1] = 1.0;
        dif[5] = 2.0;
        assert_eq!(classify_divergence(&highs, &[], &dif), Divergence::none());
    }

    #[test]
    fn candle_needs_three_bars() {
        let bars = make_bars(&[1.0, 2.0]);
        assert_eq!(detect_bullish_candle(&bars), None);
    }

    #[test]
    fn candle_hammer() {
        let bars = vec![
            make_bar(0, 10.0, 10.5, 9.5, 10.0),
            make_bar(1, 10.0, 10.5, 9.5, 10.0),
            // body 0.2, lower shadow 1.0, upper shadow 0.05
            make_bar(2, 10.0, 10.25, 9.0, 10.2),
        ];
        assert_eq!(detect_bullish_candle(&bars), Some(CandlePattern::Hammer));
    }

    #[test]
    fn candle_bullish_engulfing() {
        let bars = vec![
            make_bar(0, 10.0, 10.5, 9.5, 10.0),
            make_bar(1, 10.5, 10.6, 9.9, 10.0),
            make_bar(2, 9.9, 11.0, 9.9, 10.8),
        ];
        assert_eq!(
            detect_bullish_candle(&bars),
            Some(CandlePattern::BullishEngulfing)
        );
    }

    #[test]
    fn candle_morning_star() {
        let bars = vec![
            // long bearish: body 1.8 of range 2.0
            make_bar(0, 11.9, 12.0, 10.0, 10.1),
            // small body; the next bar opens above its close so it is not engulfed
            make_bar(1, 9.9, 10.0, 9.5, 9.8),
            // bullish, closes above 11.0, sizeable upper shadow rules out the hammer
            make_bar(2, 10.0, 12.0, 9.9, 11.2),
        ];
        assert_eq!(detect_bullish_candle(&bars), Some(CandlePattern::MorningStar));
    }

    #[test]
    fn morning_star_needs_long_first_body() {
        let bars = vec![
            // bearish but body only 0.5 of a 2.0 range
            make_bar(0, 11.0, 12.0, 10.0, 10.5),
            make_bar(1, 9.9, 10.0, 9.5, 9.8),
            make_bar(2, 10.0, 12.0, 9.9, 11.2),
        ];
        assert_eq!(detect_bullish_candle(&bars), None);
    }

    #[test]
    fn hammer_wins_over_engulfing() {
        let bars = vec![
            make_bar(0, 10.0, 10.5, 9.5, 10.0),
            make_bar(1, 10.3, 10.4, 10.0, 10.1),
            // engulfs bar 1 and also has a hammer shape
            make_bar(2, 10.0, 10.42, 8.0, 10.4),
        ];
        assert_eq!(detect_bullish_candle(&bars), Some(CandlePattern::Hammer));
    }
}
