//! Analysis core: pure functions over ascending daily or weekly bars.

pub mod config_validation;
pub mod daily_signals;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod ladder;
pub mod levels;
pub mod ohlcv;
pub mod pattern;
pub mod performance;
pub mod period_stats;
pub mod resample;
pub mod score;
pub mod series;
pub mod signal;
pub mod trend_report;
pub mod weekly_trend;
