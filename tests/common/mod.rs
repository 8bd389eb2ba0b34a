#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use etfscope::domain::error::EtfError;
pub use etfscope::domain::ohlcv::OhlcvBar;
use etfscope::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EtfError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EtfError::Storage {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect()),
            None => Err(EtfError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, EtfError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// First trading day of the generated series (a Monday).
pub fn series_start() -> NaiveDate {
    date("2023-01-02")
}

/// `n` consecutive weekdays starting at `start`.
pub fn trading_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut d = start;
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

/// Daily bars on weekdays with a ±1% high/low envelope around each close.
pub fn daily_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    trading_days(series_start(), closes.len())
        .into_iter()
        .zip(closes)
        .map(|(date, &close)| OhlcvBar {
            date,
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 100_000.0,
        })
        .collect()
}

pub fn linear(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

pub fn sine_wave(n: usize, base: f64, amplitude: f64, period: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect()
}

pub fn last_date(bars: &[OhlcvBar]) -> NaiveDate {
    bars.last().unwrap().date
}
