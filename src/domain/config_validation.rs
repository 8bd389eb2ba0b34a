//! Runtime settings assembled from a [`ConfigPort`] and validated up front.
//!
//! Every key is optional; a missing or unparseable key takes its default.
//! Values that parse but make no sense (zero periods, non-positive band
//! multiplier) are rejected with `ConfigInvalid`.

use crate::domain::error::EtfError;
use crate::domain::indicator::{boll, boll_k_x100, rsi};
use crate::domain::levels;
use crate::domain::pattern::{DAILY_DIVERGENCE_LOOKBACK, WEEKLY_DIVERGENCE_LOOKBACK};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HISTORY_DAYS: i64 = 730;
pub const DEFAULT_HIST_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub support_lookback: usize,
    pub divergence_lookback_daily: usize,
    pub divergence_lookback_weekly: usize,
    pub boll_period: usize,
    pub boll_k: f64,
    pub rsi_period: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            support_lookback: levels::DEFAULT_LOOKBACK,
            divergence_lookback_daily: DAILY_DIVERGENCE_LOOKBACK,
            divergence_lookback_weekly: WEEKLY_DIVERGENCE_LOOKBACK,
            boll_period: boll::DEFAULT_PERIOD,
            boll_k: boll::DEFAULT_K,
            rsi_period: rsi::DEFAULT_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Calendar days of history loaded for each analysis.
    pub history_days: i64,
    pub hist_ttl_secs: u64,
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            history_days: DEFAULT_HISTORY_DAYS,
            hist_ttl_secs: DEFAULT_HIST_TTL_SECS as u64,
            analysis: AnalysisConfig::default(),
        }
    }
}

pub fn load_app_config(config: &dyn ConfigPort) -> Result<AppConfig, EtfError> {
    let data_dir = config
        .get_string("data", "dir")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

    let history_days = config.get_int("data", "history_days", DEFAULT_HISTORY_DAYS);
    if history_days < 1 {
        return Err(invalid("data", "history_days", "history_days must be at least 1"));
    }

    let ttl = config.get_int("cache", "hist_ttl_secs", DEFAULT_HIST_TTL_SECS);
    if ttl < 0 {
        return Err(invalid("cache", "hist_ttl_secs", "hist_ttl_secs must be non-negative"));
    }

    Ok(AppConfig {
        data_dir: PathBuf::from(data_dir),
        history_days,
        hist_ttl_secs: ttl as u64,
        analysis: load_analysis_config(config)?,
    })
}

pub fn load_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, EtfError> {
    let defaults = AnalysisConfig::default();
    let boll_k = config.get_double("analysis", "boll_k", defaults.boll_k);
    if boll_k <= 0.0 || boll_k.is_nan() {
        return Err(invalid("analysis", "boll_k", "boll_k must be positive"));
    }
    if boll_k_x100(boll_k).is_none() {
        return Err(invalid("analysis", "boll_k", "boll_k must have at most two decimals"));
    }

    Ok(AnalysisConfig {
        support_lookback: period(config, "support_lookback", defaults.support_lookback)?,
        divergence_lookback_daily: period(
            config,
            "divergence_lookback_daily",
            defaults.divergence_lookback_daily,
        )?,
        divergence_lookback_weekly: period(
            config,
            "divergence_lookback_weekly",
            defaults.divergence_lookback_weekly,
        )?,
        boll_period: period(config, "boll_period", defaults.boll_period)?,
        boll_k,
        rsi_period: period(config, "rsi_period", defaults.rsi_period)?,
    })
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, EtfError> {
    let value = config.get_int("analysis", key, default as i64);
    if value < 1 {
        return Err(invalid("analysis", key, &format!("{} must be a positive period", key)));
    }
    Ok(value as usize)
}

fn invalid(section: &str, key: &str, reason: &str) -> EtfError {
    EtfError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
