//! Historical-period statistics and the trend judgment derived from them.

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{calculate_boll_default, calculate_macd_default, rsi_values};
use crate::domain::ladder::{apply, Rung};
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::series::{round_to, tail};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    /// Number of bars actually analysed (the request clamped to the history).
    pub periods: usize,
    pub total_change: f64,
    /// Worst close below its running peak, in percent (≤ 0).
    pub max_drawdown: f64,
    /// Best close above its running trough, in percent (≥ 0).
    pub max_rally: f64,
    pub up_periods: usize,
    pub down_periods: usize,
    pub rsi_avg: f64,
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub rsi_oversold_count: usize,
    pub rsi_overbought_count: usize,
    pub pb_avg: f64,
    pub pb_min: f64,
    pub pb_max: f64,
    pub pb_near_lower: usize,
    pub pb_near_upper: usize,
    pub macd_cross_up: usize,
    pub macd_cross_down: usize,
}

/// Summarise the trailing `periods` bars. Indicators are computed on that
/// window alone, so short windows leave the RSI and %B statistics undefined.
pub fn analyze_period(bars: &[OhlcvBar], periods: usize) -> Result<PeriodStats, AnalysisError> {
    AnalysisError::require(bars.len(), 1)?;
    let window = tail(bars, periods.max(1));
    let close = closes(window);

    let start = close[0];
    let end = close[close.len() - 1];
    let total_change = if start == 0.0 {
        0.0
    } else {
        (end - start) / start * 100.0
    };

    let (max_drawdown, max_rally) = drawdown_and_rally(&close);

    let mut up_periods = 0;
    let mut down_periods = 0;
    for w in close.windows(2) {
        if w[1] > w[0] {
            up_periods += 1;
        } else if w[1] < w[0] {
            down_periods += 1;
        }
    }

    let rsi = Distribution::of(&rsi_values(&close, 14), 30.0, 70.0);
    let pb = Distribution::of(&calculate_boll_default(window).percent_b, 20.0, 80.0);
    let (macd_cross_up, macd_cross_down) = calculate_macd_default(window).cross_counts();

    Ok(PeriodStats {
        periods: window.len(),
        total_change: round_to(total_change, 2),
        max_drawdown: round_to(max_drawdown, 2),
        max_rally: round_to(max_rally, 2),
        up_periods,
        down_periods,
        rsi_avg: round_to(rsi.avg, 1),
        rsi_min: round_to(rsi.min, 1),
        rsi_max: round_to(rsi.max, 1),
        rsi_oversold_count: rsi.below,
        rsi_overbought_count: rsi.above,
        pb_avg: round_to(pb.avg, 1),
        pb_min: round_to(pb.min, 1),
        pb_max: round_to(pb.max, 1),
        pb_near_lower: pb.below,
        pb_near_upper: pb.above,
        macd_cross_up,
        macd_cross_down,
    })
}

fn drawdown_and_rally(close: &[f64]) -> (f64, f64) {
    let mut peak = f64::NEG_INFINITY;
    let mut trough = f64::INFINITY;
    let mut max_dd = 0.0_f64;
    let mut max_rally = 0.0_f64;

    for &c in close {
        peak = peak.max(c);
        trough = trough.min(c);
        if peak != 0.0 {
            max_dd = max_dd.min((c - peak) / peak * 100.0);
        }
        if trough != 0.0 {
            max_rally = max_rally.max((c - trough) / trough * 100.0);
        }
    }
    (max_dd, max_rally)
}

/// Mean/min/max over the defined values plus counts outside `(low, high)`.
struct Distribution {
    avg: f64,
    min: f64,
    max: f64,
    below: usize,
    above: usize,
}

impl Distribution {
    fn of(values: &[f64], low: f64, high: f64) -> Self {
        let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if valid.is_empty() {
            return Self {
                avg: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                below: 0,
                above: 0,
            };
        }
        Self {
            avg: valid.iter().sum::<f64>() / valid.len() as f64,
            min: valid.iter().copied().fold(f64::INFINITY, f64::min),
            max: valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            below: valid.iter().filter(|&&v| v < low).count(),
            above: valid.iter().filter(|&&v| v > high).count(),
        }
    }
}

const CHANGE_LADDER: [Rung; 7] = [
    Rung::above(30.0, 30, "sharp rise"),
    Rung::above(15.0, 20, "clear rise"),
    Rung::above(5.0, 10, "modest rise"),
    Rung::above(-5.0, 0, "sideways"),
    Rung::above(-15.0, -10, "modest decline"),
    Rung::above(-30.0, -20, "clear decline"),
    Rung::otherwise(-30, "sharp decline"),
];

const DRAWDOWN_LADDER: [Rung; 5] = [
    Rung::below(5.0, 20, "minimal drawdown"),
    Rung::below(10.0, 10, "controlled drawdown"),
    Rung::below(20.0, 0, "moderate drawdown"),
    Rung::below(30.0, -10, "large drawdown"),
    Rung::otherwise(-20, "severe drawdown"),
];

const WIN_RATE_LADDER: [Rung; 5] = [
    Rung::above(65.0, 15, "high win rate"),
    Rung::above(55.0, 8, "above-average win rate"),
    Rung::above(45.0, 0, "balanced win rate"),
    Rung::above(35.0, -8, "below-average win rate"),
    Rung::otherwise(-15, "low win rate"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodJudgment {
    pub score: i32,
    pub judgments: Vec<String>,
}

/// Score a period: return (±30), drawdown (±20), win rate (±15), RSI bias
/// (±15), MACD cross bias (±10) and band-touch bias (±10).
pub fn judge_period(stats: &PeriodStats) -> PeriodJudgment {
    let mut score = 0;
    let mut judgments = Vec::new();

    let change = stats.total_change;
    apply(&CHANGE_LADDER, change, &mut score, &mut judgments, |label| {
        format!("{} {}%", label, change)
    });

    let drawdown = stats.max_drawdown.abs();
    apply(&DRAWDOWN_LADDER, drawdown, &mut score, &mut judgments, |label| {
        format!("{} ({}%)", label, drawdown)
    });

    let total = stats.up_periods + stats.down_periods;
    if total > 0 {
        let win_rate = stats.up_periods as f64 / total as f64 * 100.0;
        apply(&WIN_RATE_LADDER, win_rate, &mut score, &mut judgments, |label| {
            format!("{} ({:.0}%)", label, win_rate)
        });
    }

    if stats.rsi_oversold_count > stats.rsi_overbought_count + 2 {
        score += 15;
        judgments.push(format!("RSI repeatedly oversold ({} times)", stats.rsi_oversold_count));
    } else if stats.rsi_overbought_count > stats.rsi_oversold_count + 2 {
        score -= 15;
        judgments.push(format!(
            "RSI repeatedly overbought ({} times)",
            stats.rsi_overbought_count
        ));
    } else if stats.rsi_avg > 55.0 {
        score += 8;
        judgments.push(format!("RSI average strong ({})", stats.rsi_avg));
    } else if stats.rsi_avg < 45.0 {
        score -= 8;
        judgments.push(format!("RSI average weak ({})", stats.rsi_avg));
    }

    if stats.macd_cross_up > stats.macd_cross_down + 1 {
        score += 10;
        judgments.push(format!("mostly MACD golden crosses ({})", stats.macd_cross_up));
    } else if stats.macd_cross_down > stats.macd_cross_up + 1 {
        score -= 10;
        judgments.push(format!("mostly MACD death crosses ({})", stats.macd_cross_down));
    }

    if stats.pb_near_lower > stats.pb_near_upper + 2 {
        score += 10;
        judgments.push(format!("repeatedly touched lower band ({} times)", stats.pb_near_lower));
    } else if stats.pb_near_upper > stats.pb_near_lower + 2 {
        score -= 10;
        judgments.push(format!("repeatedly touched upper band ({} times)", stats.pb_near_upper));
    }

    PeriodJudgment { score, judgments }
}
