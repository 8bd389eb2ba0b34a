//! Single-period technical score.
//!
//! Weighted sum of five factors read at the last bar:
//! BOLL %B (±35), volume (±20), RSI(14) (±15), MACD (±15), MA alignment (±15).

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{calculate_boll_default, calculate_ma, calculate_macd_default, rsi_values};
use crate::domain::ladder::{apply, Rung};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};
use crate::domain::series::{last, rolling_mean};
use crate::domain::signal::volume_ratio;
use serde::Serialize;

pub const MIN_SCORE_BARS: usize = 20;

const PERCENT_B_LADDER: [Rung; 6] = [
    Rung::below(10.0, 35, "BOLL deeply oversold"),
    Rung::below(20.0, 25, "BOLL near lower band"),
    Rung::below(35.0, 15, "BOLL leaning to lower band"),
    Rung::above(90.0, -35, "BOLL deeply overbought"),
    Rung::above(80.0, -25, "BOLL near upper band"),
    Rung::above(65.0, -15, "BOLL leaning to upper band"),
];

const RSI_LADDER: [Rung; 6] = [
    Rung::below(20.0, 15, "RSI deeply oversold"),
    Rung::below(30.0, 10, "RSI oversold"),
    Rung::above(80.0, -15, "RSI deeply overbought"),
    Rung::above(70.0, -10, "RSI overbought"),
    Rung::above(50.0, 5, "RSI above 50").silent(),
    Rung::otherwise(-5, "RSI at or below 50").silent(),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: i32,
    pub details: Vec<String>,
    pub rsi: f64,
    pub percent_b: f64,
    pub dif: f64,
    pub dea: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    /// MA60, or MA20 when there are not more than 60 bars.
    pub ma60: f64,
    pub volume_ratio: f64,
}

pub fn calculate_period_score(bars: &[OhlcvBar]) -> Result<ScoreResult, AnalysisError> {
    AnalysisError::require(bars.len(), MIN_SCORE_BARS)?;
    let n = bars.len();
    let close = closes(bars);
    let latest = last(&close);

    let ma5 = last(&calculate_ma(bars, 5));
    let ma10 = last(&calculate_ma(bars, 10));
    let ma20 = last(&calculate_ma(bars, 20));
    let ma60 = if n > 60 {
        last(&calculate_ma(bars, 60.min(n - 1)))
    } else {
        ma20
    };

    let macd = calculate_macd_default(bars);
    let dif = last(&macd.dif);
    let dea = last(&macd.dea);
    let rsi = last(&rsi_values(&close, 14));
    let percent_b = last(&calculate_boll_default(bars).percent_b);

    let vol = volumes(bars);
    let vol_ma5 = last(&rolling_mean(&vol, 5));
    let vol_ma20 = if n > 20 {
        last(&rolling_mean(&vol, 20.min(n - 1)))
    } else {
        vol_ma5
    };
    let ratio = volume_ratio(last(&vol), vol_ma5);
    let vol_trend = if vol_ma20 > 0.0 { vol_ma5 / vol_ma20 } else { 1.0 };

    let mut score = 0;
    let mut details = Vec::new();

    apply(&PERCENT_B_LADDER, percent_b, &mut score, &mut details, |label| {
        format!("{} ({:.1}%)", label, percent_b)
    });

    score += volume_points(ratio, vol_trend, latest, ma5);

    apply(&RSI_LADDER, rsi, &mut score, &mut details, |label| {
        format!("{} ({:.1})", label, rsi)
    });

    if dif > dea && dif > 0.0 {
        score += 15;
        details.push("MACD golden cross above zero".to_string());
    } else if dif > dea && dif < 0.0 {
        score += 8;
        details.push("MACD golden cross below zero".to_string());
    } else if dif < dea && dif < 0.0 {
        score -= 15;
        details.push("MACD death cross below zero".to_string());
    } else if dif < dea && dif > 0.0 {
        score -= 8;
        details.push("MACD death cross above zero".to_string());
    }

    if latest > ma5 && ma5 > ma10 && ma10 > ma20 && ma20 > ma60 {
        score += 15;
        details.push("MA bullish alignment".to_string());
    } else if latest > ma5 && ma5 > ma10 && ma10 > ma20 {
        score += 10;
        details.push("short-term bullish".to_string());
    } else if latest < ma5 && ma5 < ma10 && ma10 < ma20 && ma20 < ma60 {
        score -= 15;
        details.push("MA bearish alignment".to_string());
    } else if latest < ma5 && ma5 < ma10 && ma10 < ma20 {
        score -= 10;
        details.push("short-term bearish".to_string());
    } else {
        details.push("MAs intertwined".to_string());
    }

    Ok(ScoreResult {
        score,
        details,
        rsi,
        percent_b,
        dif,
        dea,
        ma5,
        ma10,
        ma20,
        ma60,
        volume_ratio: ratio,
    })
}

/// Heavy volume counts in the direction of price against MA5; otherwise the
/// MA5/MA20 volume trend gives a small nudge.
fn volume_points(ratio: f64, vol_trend: f64, price: f64, ma5: f64) -> i32 {
    let up = price > ma5;
    let down = price < ma5;
    if ratio > 2.0 && up {
        20
    } else if ratio > 1.5 && up {
        15
    } else if ratio > 2.0 && down {
        -20
    } else if ratio > 1.5 && down {
        -15
    } else if vol_trend > 1.2 {
        5
    } else if vol_trend < 0.8 {
        -5
    } else {
        0
    }
}
