//! Signals and the latest-value indicator snapshot they are read from.

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{
    calculate_boll_default, calculate_kdj_default, calculate_ma, calculate_macd_default,
    rsi_values,
};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};
use crate::domain::performance::{price_info, PriceInfo};
use crate::domain::series::{last, rolling_mean};
use serde::Serialize;

/// Bars needed before a snapshot is meaningful.
pub const MIN_SNAPSHOT_BARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub description: String,
    pub category: SignalCategory,
    pub weight: i32,
}

impl Signal {
    pub fn bullish(description: impl Into<String>, weight: i32) -> Self {
        Self {
            description: description.into(),
            category: SignalCategory::Bullish,
            weight,
        }
    }

    pub fn bearish(description: impl Into<String>, weight: i32) -> Self {
        Self {
            description: description.into(),
            category: SignalCategory::Bearish,
            weight,
        }
    }

    pub fn neutral(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: SignalCategory::Neutral,
            weight: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSet {
    pub bullish: Vec<Signal>,
    pub bearish: Vec<Signal>,
    pub neutral: Vec<Signal>,
    pub overall: Overall,
}

impl Default for SignalSet {
    fn default() -> Self {
        Self {
            bullish: Vec::new(),
            bearish: Vec::new(),
            neutral: Vec::new(),
            overall: Overall::Neutral,
        }
    }
}

impl SignalSet {
    pub fn push(&mut self, signal: Signal) {
        match signal.category {
            SignalCategory::Bullish => self.bullish.push(signal),
            SignalCategory::Bearish => self.bearish.push(signal),
            SignalCategory::Neutral => self.neutral.push(signal),
        }
        self.overall = self.compute_overall();
    }

    /// One side must lead the other by at least two signals.
    fn compute_overall(&self) -> Overall {
        let bull = self.bullish.len();
        let bear = self.bearish.len();
        if bull > bear + 1 {
            Overall::Bullish
        } else if bear > bull + 1 {
            Overall::Bearish
        } else {
            Overall::Neutral
        }
    }

    pub fn from_snapshot(snapshot: &IndicatorSnapshot) -> Self {
        let mut set = SignalSet::default();

        let pb = snapshot.boll.percent_b;
        set.push(if pb < 20.0 {
            Signal::bullish("BOLL: price near the lower band, possibly oversold", 1)
        } else if pb > 80.0 {
            Signal::bearish("BOLL: price near the upper band, possibly overbought", 1)
        } else {
            Signal::neutral("BOLL: price inside the middle of the bands")
        });

        let rsi = snapshot.rsi.rsi_14;
        set.push(if rsi < 30.0 {
            Signal::bullish(format!("RSI({:.1}): oversold, rebound possible", rsi), 1)
        } else if rsi > 70.0 {
            Signal::bearish(format!("RSI({:.1}): overbought, pullback possible", rsi), 1)
        } else {
            Signal::neutral(format!("RSI({:.1}): neutral", rsi))
        });

        set.push(match snapshot.macd.zone {
            MacdZone::StrongBull => Signal::bullish("MACD: DIF above DEA and positive", 1),
            MacdZone::StrongBear => Signal::bearish("MACD: DIF below DEA and negative", 1),
            MacdZone::GoldenCross => Signal::bullish("MACD: golden cross", 1),
            MacdZone::DeathCross => Signal::bearish("MACD: death cross", 1),
        });

        set.push(match snapshot.ma.trend {
            MaTrend::BullishAlignment => Signal::bullish("MA: bullish alignment, uptrend", 1),
            MaTrend::BearishAlignment => Signal::bearish("MA: bearish alignment, downtrend", 1),
            MaTrend::Mixed => Signal::neutral("MA: intertwined, ranging"),
        });

        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BollZone {
    NearLower,
    NearUpper,
    Weak,
    Strong,
}

impl BollZone {
    pub fn classify(percent_b: f64) -> Self {
        if percent_b < 20.0 {
            BollZone::NearLower
        } else if percent_b > 80.0 {
            BollZone::NearUpper
        } else if percent_b < 50.0 {
            BollZone::Weak
        } else {
            BollZone::Strong
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Oversold,
    Overbought,
    Weak,
    Strong,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi < 30.0 {
            RsiZone::Oversold
        } else if rsi > 70.0 {
            RsiZone::Overbought
        } else if rsi < 50.0 {
            RsiZone::Weak
        } else {
            RsiZone::Strong
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdZone {
    StrongBull,
    StrongBear,
    GoldenCross,
    DeathCross,
}

impl MacdZone {
    pub fn classify(dif: f64, dea: f64) -> Self {
        if dif > dea && dif > 0.0 {
            MacdZone::StrongBull
        } else if dif < dea && dif < 0.0 {
            MacdZone::StrongBear
        } else if dif > dea {
            MacdZone::GoldenCross
        } else {
            MacdZone::DeathCross
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KdjZone {
    Oversold,
    Overbought,
    Bullish,
    Bearish,
}

impl KdjZone {
    pub fn classify(k: f64, d: f64) -> Self {
        if k < 20.0 && d < 20.0 {
            KdjZone::Oversold
        } else if k > 80.0 && d > 80.0 {
            KdjZone::Overbought
        } else if k > d {
            KdjZone::Bullish
        } else {
            KdjZone::Bearish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaTrend {
    BullishAlignment,
    BearishAlignment,
    Mixed,
}

impl MaTrend {
    pub fn classify(price: f64, ma5: f64, ma10: f64, ma20: f64) -> Self {
        if price > ma5 && ma5 > ma10 && ma10 > ma20 {
            MaTrend::BullishAlignment
        } else if price < ma5 && ma5 < ma10 && ma10 < ma20 {
            MaTrend::BearishAlignment
        } else {
            MaTrend::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub bandwidth: f64,
    pub percent_b: f64,
    pub zone: BollZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiSnapshot {
    pub rsi_6: f64,
    pub rsi_12: f64,
    pub rsi_14: f64,
    pub zone: RsiZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSnapshot {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
    pub zone: MacdZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KdjSnapshot {
    pub k: f64,
    pub d: f64,
    pub j: f64,
    pub zone: KdjZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaSnapshot {
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    /// Only reported with more than 60 bars of history.
    pub ma60: Option<f64>,
    pub trend: MaTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSnapshot {
    pub current: f64,
    pub ma5: f64,
    /// current / MA5 volume, 1 when MA5 volume is not positive.
    pub ratio: f64,
}

/// Latest value of every indicator the reports use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub price: PriceInfo,
    pub boll: BollSnapshot,
    pub rsi: RsiSnapshot,
    pub macd: MacdSnapshot,
    pub kdj: KdjSnapshot,
    pub ma: MaSnapshot,
    pub volume: VolumeSnapshot,
}

impl IndicatorSnapshot {
    pub fn from_bars(bars: &[OhlcvBar]) -> Result<Self, AnalysisError> {
        AnalysisError::require(bars.len(), MIN_SNAPSHOT_BARS)?;

        let close = closes(bars);
        let price = price_info(bars)?;
        let latest = price.latest_price;

        let boll = calculate_boll_default(bars);
        let percent_b = last(&boll.percent_b);
        let boll = BollSnapshot {
            upper: last(&boll.upper),
            middle: last(&boll.middle),
            lower: last(&boll.lower),
            bandwidth: last(&boll.bandwidth),
            percent_b,
            zone: BollZone::classify(percent_b),
        };

        let rsi_14 = last(&rsi_values(&close, 14));
        let rsi = RsiSnapshot {
            rsi_6: last(&rsi_values(&close, 6)),
            rsi_12: last(&rsi_values(&close, 12)),
            rsi_14,
            zone: RsiZone::classify(rsi_14),
        };

        let macd = calculate_macd_default(bars);
        let (dif, dea) = (last(&macd.dif), last(&macd.dea));
        let macd = MacdSnapshot {
            dif,
            dea,
            histogram: last(&macd.histogram),
            zone: MacdZone::classify(dif, dea),
        };

        let kdj = calculate_kdj_default(bars);
        let (k, d) = (last(&kdj.k), last(&kdj.d));
        let kdj = KdjSnapshot {
            k,
            d,
            j: last(&kdj.j),
            zone: KdjZone::classify(k, d),
        };

        let ma5 = last(&calculate_ma(bars, 5));
        let ma10 = last(&calculate_ma(bars, 10));
        let ma20 = last(&calculate_ma(bars, 20));
        let ma60 = (bars.len() > 60).then(|| last(&calculate_ma(bars, 60.min(bars.len() - 1))));
        let ma = MaSnapshot {
            ma5,
            ma10,
            ma20,
            ma60,
            trend: MaTrend::classify(latest, ma5, ma10, ma20),
        };

        let vol = volumes(bars);
        let vol_ma5 = last(&rolling_mean(&vol, 5));
        let current = last(&vol);
        let volume = VolumeSnapshot {
            current,
            ma5: vol_ma5,
            ratio: volume_ratio(current, vol_ma5),
        };

        Ok(Self {
            price,
            boll,
            rsi,
            macd,
            kdj,
            ma,
            volume,
        })
    }
}

pub fn volume_ratio(current: f64, average: f64) -> f64 {
    if average > 0.0 { current / average } else { 1.0 }
}
