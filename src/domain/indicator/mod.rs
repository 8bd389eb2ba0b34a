//! Technical indicator implementations.
//!
//! Each indicator lives in its own module and returns either a plain aligned
//! `Vec<f64>` (single-line indicators) or a typed result struct with named
//! fields. For heterogeneous collections (e.g. a requested set of indicators)
//! the results are wrapped in:
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorOutput`: enum over the possible output shapes
//! - `IndicatorSeries`: the pair of the two

pub mod atr;
pub mod boll;
pub mod ema;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod obv;
pub mod rsi;

pub use atr::calculate_atr;
pub use boll::{calculate_boll, calculate_boll_default, BollResult};
pub use ema::calculate_ema;
pub use kdj::{calculate_kdj, calculate_kdj_default, KdjResult};
pub use ma::calculate_ma;
pub use macd::{calculate_macd, calculate_macd_default, macd_values, MacdResult};
pub use obv::calculate_obv;
pub use rsi::{calculate_rsi, rsi_values};

use crate::domain::error::EtfError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum IndicatorType {
    Ma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    Atr { period: usize },
    Obv,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj { n: usize, m1: usize, m2: usize },
    Boll { period: usize, k_x100: u32 },
}

/// Output of one indicator, aligned with the input bars.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorOutput {
    Line { values: Vec<f64> },
    Boll(BollResult),
    Macd(MacdResult),
    Kdj(KdjResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub output: IndicatorOutput,
}

impl IndicatorOutput {
    /// Named components in a fixed order.
    pub fn components(&self) -> Vec<(&'static str, &[f64])> {
        match self {
            IndicatorOutput::Line { values } => vec![("value", values.as_slice())],
            IndicatorOutput::Boll(b) => vec![
                ("upper", b.upper.as_slice()),
                ("middle", b.middle.as_slice()),
                ("lower", b.lower.as_slice()),
                ("bandwidth", b.bandwidth.as_slice()),
                ("percent_b", b.percent_b.as_slice()),
            ],
            IndicatorOutput::Macd(m) => vec![
                ("dif", m.dif.as_slice()),
                ("dea", m.dea.as_slice()),
                ("histogram", m.histogram.as_slice()),
            ],
            IndicatorOutput::Kdj(k) => vec![
                ("k", k.k.as_slice()),
                ("d", k.d.as_slice()),
                ("j", k.j.as_slice()),
            ],
        }
    }

    pub fn component(&self, name: &str) -> Option<&[f64]> {
        self.components()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.components().first().map_or(0, |(_, v)| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A band multiplier in hundredths, as carried by [`IndicatorType::Boll`].
/// `None` unless `k` is positive and has at most two decimals.
pub fn boll_k_x100(k: f64) -> Option<u32> {
    let scaled = k * 100.0;
    let rounded = scaled.round();
    if !k.is_finite() || rounded < 1.0 || rounded > u32::MAX as f64 {
        return None;
    }
    ((scaled - rounded).abs() < 1e-6).then_some(rounded as u32)
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ma { period } => write!(f, "MA({})", period),
            IndicatorType::Ema { period } => write!(f, "EMA({})", period),
            IndicatorType::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorType::Atr { period } => write!(f, "ATR({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj { n, m1, m2 } => write!(f, "KDJ({},{},{})", n, m1, m2),
            IndicatorType::Boll { period, k_x100 } => {
                let k = *k_x100 as f64 / 100.0;
                write!(f, "BOLL({},{})", period, k)
            }
        }
    }
}

impl FromStr for IndicatorType {
    type Err = EtfError;

    /// Parses the `Display` form, e.g. `MA(20)`, `MACD(12,26,9)`, `BOLL(20,2.5)`.
    /// Parameters may be omitted to take the conventional defaults (`RSI` = `RSI(14)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EtfError::InvalidArgument {
            reason: format!("indicator '{}': {}", s, reason),
        };

        let s_trim = s.trim();
        let (name, args) = match s_trim.find('(') {
            Some(open) => {
                let close = s_trim
                    .rfind(')')
                    .filter(|&c| c > open)
                    .ok_or_else(|| invalid("missing ')'"))?;
                (&s_trim[..open], &s_trim[open + 1..close])
            }
            None => (s_trim, ""),
        };

        let args: Vec<&str> = args
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        let int_arg = |i: usize, default: usize| -> Result<usize, EtfError> {
            match args.get(i) {
                Some(a) => a.parse().map_err(|_| invalid("expected integer parameter")),
                None => Ok(default),
            }
        };

        let parsed = match name.to_ascii_uppercase().as_str() {
            "MA" | "SMA" => IndicatorType::Ma {
                period: int_arg(0, 20)?,
            },
            "EMA" => IndicatorType::Ema {
                period: int_arg(0, 20)?,
            },
            "RSI" => IndicatorType::Rsi {
                period: int_arg(0, rsi::DEFAULT_PERIOD)?,
            },
            "ATR" => IndicatorType::Atr {
                period: int_arg(0, atr::DEFAULT_PERIOD)?,
            },
            "OBV" => IndicatorType::Obv,
            "MACD" => IndicatorType::Macd {
                fast: int_arg(0, macd::DEFAULT_FAST)?,
                slow: int_arg(1, macd::DEFAULT_SLOW)?,
                signal: int_arg(2, macd::DEFAULT_SIGNAL)?,
            },
            "KDJ" => IndicatorType::Kdj {
                n: int_arg(0, kdj::DEFAULT_N)?,
                m1: int_arg(1, kdj::DEFAULT_M1)?,
                m2: int_arg(2, kdj::DEFAULT_M2)?,
            },
            "BOLL" => {
                let k: f64 = match args.get(1) {
                    Some(a) => a.parse().map_err(|_| invalid("expected numeric multiplier"))?,
                    None => boll::DEFAULT_K,
                };
                let k_x100 = boll_k_x100(k)
                    .ok_or_else(|| invalid("multiplier must be positive with at most two decimals"))?;
                IndicatorType::Boll {
                    period: int_arg(0, boll::DEFAULT_PERIOD)?,
                    k_x100,
                }
            }
            _ => return Err(invalid("unknown indicator")),
        };
        Ok(parsed)
    }
}
