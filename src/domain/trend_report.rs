//! Multi-horizon trend report on weekly bars: the current single-period score
//! blended with the judgments of the last quarter, half year and year.

use crate::domain::error::AnalysisError;
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::period_stats::{analyze_period, judge_period, PeriodJudgment, PeriodStats};
use crate::domain::resample::resample_to_weekly;
use crate::domain::score::{calculate_period_score, ScoreResult};
use crate::domain::series::last;
use serde::Serialize;

pub const MIN_TREND_WEEKLY_BARS: usize = 30;
pub const MIN_TREND_DAILY_BARS: usize = 60;

/// Horizons in weekly bars: quarter, half year, year.
pub const TREND_HORIZONS: [usize; 3] = [13, 26, 52];

const CURRENT_WEIGHT: f64 = 0.4;
const HORIZON_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendVerdict {
    StrongUptrend,
    BullishRanging,
    Sideways,
    BearishRanging,
    WeakDowntrend,
}

impl TrendVerdict {
    pub fn for_score(score: i32) -> Self {
        match score {
            s if s >= 40 => TrendVerdict::StrongUptrend,
            s if s >= 15 => TrendVerdict::BullishRanging,
            s if s >= -15 => TrendVerdict::Sideways,
            s if s >= -40 => TrendVerdict::BearishRanging,
            _ => TrendVerdict::WeakDowntrend,
        }
    }

    pub fn suggestion(self) -> &'static str {
        match self {
            TrendVerdict::StrongUptrend => "hold, or add on dips",
            TrendVerdict::BullishRanging => "a light position is reasonable; watch for pullbacks",
            TrendVerdict::Sideways => "stay on the sidelines until direction is clear",
            TrendVerdict::BearishRanging => "reduce or stay out; trade cautiously",
            TrendVerdict::WeakDowntrend => "avoid; wait in cash for stabilisation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonReport {
    pub requested_periods: usize,
    pub stats: PeriodStats,
    pub judgment: PeriodJudgment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub latest_price: f64,
    pub current: ScoreResult,
    pub horizons: Vec<HorizonReport>,
    pub composite_score: i32,
    pub verdict: TrendVerdict,
    pub suggestion: &'static str,
}

/// 0.4 × current + 0.2 × each horizon score, truncated toward zero.
///
/// Terms are added left to right starting from the current score; the
/// truncated result depends on that order near integer boundaries.
pub fn composite_score(current: i32, horizon_scores: &[i32]) -> i32 {
    let blended = horizon_scores
        .iter()
        .fold(current as f64 * CURRENT_WEIGHT, |acc, s| {
            acc + *s as f64 * HORIZON_WEIGHT
        });
    blended.trunc() as i32
}

pub fn analyze_trend(weekly: &[OhlcvBar]) -> Result<TrendReport, AnalysisError> {
    AnalysisError::require(weekly.len(), MIN_TREND_WEEKLY_BARS)?;

    let current = calculate_period_score(weekly)?;
    let horizons = TREND_HORIZONS
        .iter()
        .map(|&periods| {
            let stats = analyze_period(weekly, periods)?;
            let judgment = judge_period(&stats);
            Ok(HorizonReport {
                requested_periods: periods,
                stats,
                judgment,
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let scores: Vec<i32> = horizons.iter().map(|h| h.judgment.score).collect();
    let composite = composite_score(current.score, &scores);
    let verdict = TrendVerdict::for_score(composite);

    Ok(TrendReport {
        latest_price: last(&closes(weekly)),
        current,
        horizons,
        composite_score: composite,
        verdict,
        suggestion: verdict.suggestion(),
    })
}

/// Resample daily bars to weeks and run [`analyze_trend`].
pub fn analyze_trend_from_daily(daily: &[OhlcvBar]) -> Result<TrendReport, AnalysisError> {
    AnalysisError::require(daily.len(), MIN_TREND_DAILY_BARS)?;
    analyze_trend(&resample_to_weekly(daily))
}
