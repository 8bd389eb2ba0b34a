//! Daily → weekly resampling.
//!
//! Weeks run Monday..Sunday and each weekly bar carries the date of the Sunday
//! that closes its week. Within a week: open is the first defined open, high
//! the max, low the min, close the last defined close, volume the sum. A week
//! whose open/high/low/close cannot all be determined is dropped.

use crate::domain::ohlcv::OhlcvBar;
use chrono::{Datelike, Duration, NaiveDate};

/// The Sunday that ends the week containing `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
    date + Duration::days(days_to_sunday)
}

pub fn resample_to_weekly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut weeks: Vec<WeekAccumulator> = Vec::new();

    for bar in bars {
        let end = week_ending(bar.date);
        match weeks.last_mut() {
            Some(acc) if acc.date == end => acc.push(bar),
            _ => {
                let mut acc = WeekAccumulator::new(end);
                acc.push(bar);
                weeks.push(acc);
            }
        }
    }

    weeks.into_iter().filter_map(WeekAccumulator::finish).collect()
}

struct WeekAccumulator {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: f64,
}

impl WeekAccumulator {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: 0.0,
        }
    }

    fn push(&mut self, bar: &OhlcvBar) {
        if self.open.is_none() && !bar.open.is_nan() {
            self.open = Some(bar.open);
        }
        if !bar.high.is_nan() {
            self.high = Some(self.high.map_or(bar.high, |h| h.max(bar.high)));
        }
        if !bar.low.is_nan() {
            self.low = Some(self.low.map_or(bar.low, |l| l.min(bar.low)));
        }
        if !bar.close.is_nan() {
            self.close = Some(bar.close);
        }
        if !bar.volume.is_nan() {
            self.volume += bar.volume;
        }
    }

    fn finish(self) -> Option<OhlcvBar> {
        Some(OhlcvBar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume,
        })
    }
}
