//! Price change and trailing-return summaries, the per-symbol rows used when
//! comparing several funds, and gainer/loser rankings.

use crate::domain::error::{AnalysisError, EtfError};
use crate::domain::indicator::{calculate_boll_default, calculate_macd_default, calculate_rsi};
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::resample::resample_to_weekly;
use crate::domain::series::{last, nth_back, round_to};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const MIN_COMPARE_SYMBOLS: usize = 2;
pub const MAX_COMPARE_SYMBOLS: usize = 5;
pub const MAX_BATCH_SYMBOLS: usize = 10;

/// Daily bars needed before a comparison row is computed.
pub const MIN_COMPARISON_BARS: usize = 30;

/// Trading-day horizons: one week, one month, one quarter, one year.
pub const RETURN_HORIZONS: [usize; 4] = [5, 22, 66, 250];

/// Percentage change from `from` to `to`; `None` when `from` is zero or either
/// side is undefined.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 || from.is_nan() || to.is_nan() {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInfo {
    pub latest_price: f64,
    /// Change against the previous bar (0 with a single bar).
    pub period_change_pct: Option<f64>,
    /// Change against the bar four periods back (0 with five bars or fewer).
    pub four_period_change_pct: Option<f64>,
}

pub fn price_info(bars: &[OhlcvBar]) -> Result<PriceInfo, AnalysisError> {
    AnalysisError::require(bars.len(), 1)?;
    let close = closes(bars);
    let latest = last(&close);
    let prev = if close.len() > 1 { nth_back(&close, 1) } else { latest };
    let four_back = if close.len() > 4 { nth_back(&close, 4) } else { latest };

    Ok(PriceInfo {
        latest_price: latest,
        period_change_pct: pct_change(prev, latest),
        four_period_change_pct: pct_change(four_back, latest),
    })
}

/// Return over the trailing `n` bars, measured from the close `n - 1` bars back
/// so that a five-bar horizon spans one trading week. `None` when the series
/// is shorter than `n`.
pub fn trailing_return(bars: &[OhlcvBar], n: usize) -> Option<f64> {
    if n == 0 || bars.len() < n {
        return None;
    }
    let latest = bars[bars.len() - 1].close;
    let base = bars[bars.len() - n].close;
    pct_change(base, latest)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailingReturns {
    pub week: Option<f64>,
    pub month: Option<f64>,
    pub quarter: Option<f64>,
    pub year: Option<f64>,
}

pub fn trailing_returns(bars: &[OhlcvBar]) -> TrailingReturns {
    let [week, month, quarter, year] = RETURN_HORIZONS.map(|n| trailing_return(bars, n));
    TrailingReturns {
        week,
        month,
        quarter,
        year,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSide {
    /// DIF above DEA.
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub symbol: String,
    pub price: f64,
    pub returns: TrailingReturns,
    pub weekly_rsi14: f64,
    pub weekly_macd: MacdSide,
    pub weekly_percent_b: f64,
}

/// Summarise one symbol from its daily bars. Indicators are read on the
/// weekly resample, returns on the daily series.
pub fn comparison_row(symbol: &str, daily: &[OhlcvBar]) -> Result<ComparisonRow, AnalysisError> {
    AnalysisError::require(daily.len(), MIN_COMPARISON_BARS)?;
    let weekly = resample_to_weekly(daily);
    AnalysisError::require(weekly.len(), 1)?;

    let macd = calculate_macd_default(&weekly);
    let side = if last(&macd.dif) > last(&macd.dea) {
        MacdSide::Long
    } else {
        MacdSide::Short
    };

    Ok(ComparisonRow {
        symbol: symbol.to_string(),
        price: daily[daily.len() - 1].close,
        returns: trailing_returns(daily),
        weekly_rsi14: last(&calculate_rsi(&weekly, 14)),
        weekly_macd: side,
        weekly_percent_b: last(&calculate_boll_default(&weekly).percent_b),
    })
}

/// Horizon of a performance ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPeriod {
    /// Latest bar against the previous close.
    Day,
    Week,
    Month,
}

impl RankPeriod {
    /// Bars spanned, counting the latest one.
    pub fn bars(self) -> usize {
        match self {
            RankPeriod::Day => 2,
            RankPeriod::Week => RETURN_HORIZONS[0],
            RankPeriod::Month => RETURN_HORIZONS[1],
        }
    }
}

impl fmt::Display for RankPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankPeriod::Day => "day",
            RankPeriod::Week => "week",
            RankPeriod::Month => "month",
        };
        f.write_str(name)
    }
}

impl FromStr for RankPeriod {
    type Err = EtfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(RankPeriod::Day),
            "week" => Ok(RankPeriod::Week),
            "month" => Ok(RankPeriod::Month),
            other => Err(EtfError::InvalidArgument {
                reason: format!("unknown ranking period '{}' (day, week or month)", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub symbol: String,
    /// Percent change over the period, two decimals.
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub period: RankPeriod,
    pub gainers: Vec<RankEntry>,
    pub losers: Vec<RankEntry>,
}

/// Change over `period` for one symbol; `None` when the history is shorter
/// than the period or the base close is zero.
pub fn rank_entry(symbol: &str, daily: &[OhlcvBar], period: RankPeriod) -> Option<RankEntry> {
    trailing_return(daily, period.bars()).map(|change| RankEntry {
        symbol: symbol.to_string(),
        change_pct: round_to(change, 2),
    })
}

/// Top `top` entries by change in each direction. Ties keep symbol order.
pub fn rank_performance(mut entries: Vec<RankEntry>, period: RankPeriod, top: usize) -> Ranking {
    entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut gainers = entries.clone();
    gainers.sort_by(|a, b| b.change_pct.total_cmp(&a.change_pct));
    gainers.truncate(top);

    let mut losers = entries;
    losers.sort_by(|a, b| a.change_pct.total_cmp(&b.change_pct));
    losers.truncate(top);

    Ranking {
        period,
        gainers,
        losers,
    }
}

/// Check a requested symbol list against `min..=max`.
pub fn check_symbol_count(symbols: &[String], min: usize, max: usize) -> Result<(), EtfError> {
    if symbols.len() < min {
        return Err(EtfError::InvalidArgument {
            reason: format!("need at least {} symbols, got {}", min, symbols.len()),
        });
    }
    if symbols.len() > max {
        return Err(EtfError::InvalidArgument {
            reason: format!("at most {} symbols supported, got {}", max, symbols.len()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn pct_change_guards_zero() {
        assert_eq!(pct_change(0.0, 5.0), None);
        assert!((pct_change(100.0, 110.0).unwrap() - 10.0).abs() < 1e-10);
        assert!(pct_change(f64::NAN, 1.0).is_none());
    }

    #[test]
    fn price_info_single_bar() {
        let info = price_info(&make_bars(&[50.0])).unwrap();
        assert_eq!(info.latest_price, 50.0);
        assert_eq!(info.period_change_pct, Some(0.0));
        assert_eq!(info.four_period_change_pct, Some(0.0));
    }

    #[test]
    fn price_info_changes() {
        let info = price_info(&make_bars(&[80.0, 90.0, 95.0, 98.0, 100.0])).unwrap();
        let period = info.period_change_pct.unwrap();
        let four = info.four_period_change_pct.unwrap();
        assert!((period - (2.0 / 98.0 * 100.0)).abs() < 1e-10);
        assert!((four - 25.0).abs() < 1e-10);
    }

    #[test]
    fn price_info_empty_is_insufficient() {
        assert!(price_info(&[]).is_err());
    }

    #[test]
    fn trailing_returns_respect_history() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let r = trailing_returns(&make_bars(&prices));
        // five-bar window: 125 → 129
        assert!((r.week.unwrap() - 4.0 / 125.0 * 100.0).abs() < 1e-10);
        // 22-bar window: 108 → 129
        assert!((r.month.unwrap() - 21.0 / 108.0 * 100.0).abs() < 1e-10);
        assert_eq!(r.quarter, None);
        assert_eq!(r.year, None);
    }

    #[test]
    fn comparison_row_for_rising_series() {
        let prices: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.5).collect();
        let row = comparison_row("510300", &make_bars(&prices)).unwrap();
        assert_eq!(row.symbol, "510300");
        assert_eq!(row.price, prices[119]);
        assert_eq!(row.weekly_macd, MacdSide::Long);
        assert!(row.weekly_rsi14 > 70.0);
    }

    #[test]
    fn comparison_row_needs_history() {
        let err = comparison_row("X", &make_bars(&[1.0; 10])).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { have: 10, need: 30 });
    }

    fn entry(symbol: &str, change_pct: f64) -> RankEntry {
        RankEntry {
            symbol: symbol.to_string(),
            change_pct,
        }
    }

    #[test]
    fn rank_entry_uses_period_window() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&prices);

        let week = rank_entry("A", &bars, RankPeriod::Week).unwrap();
        // 125 → 129
        assert_eq!(week.change_pct, 3.2);
        let day = rank_entry("A", &bars, RankPeriod::Day).unwrap();
        assert_eq!(day.change_pct, round_to(1.0 / 128.0 * 100.0, 2));
        assert!(rank_entry("A", &bars[..10], RankPeriod::Month).is_none());
    }

    #[test]
    fn ranking_orders_both_directions() {
        let entries = vec![
            entry("C", 1.5),
            entry("A", -2.0),
            entry("B", 4.25),
            entry("D", 1.5),
            entry("E", -0.5),
        ];
        let ranking = rank_performance(entries, RankPeriod::Week, 3);

        let gainers: Vec<&str> = ranking.gainers.iter().map(|e| e.symbol.as_str()).collect();
        let losers: Vec<&str> = ranking.losers.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(gainers, vec!["B", "C", "D"]);
        assert_eq!(losers, vec!["A", "E", "C"]);
        assert_eq!(ranking.period, RankPeriod::Week);
    }

    #[test]
    fn ranking_top_larger_than_input() {
        let ranking = rank_performance(vec![entry("A", 1.0)], RankPeriod::Day, 10);
        assert_eq!(ranking.gainers.len(), 1);
        assert_eq!(ranking.losers.len(), 1);
    }

    #[test]
    fn rank_period_parses_names() {
        assert_eq!("Week".parse::<RankPeriod>().unwrap(), RankPeriod::Week);
        assert_eq!("month".parse::<RankPeriod>().unwrap().bars(), 22);
        assert!("year".parse::<RankPeriod>().is_err());
    }

    #[test]
    fn symbol_count_bounds() {
        let one = vec!["A".to_string()];
        let six: Vec<String> = (0..6).map(|i| i.to_string()).collect();
        assert!(check_symbol_count(&one, 2, 5).is_err());
        assert!(check_symbol_count(&six, 2, 5).is_err());
        assert!(check_symbol_count(&six[..3], 2, 5).is_ok());
    }
}
