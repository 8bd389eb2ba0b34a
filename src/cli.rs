//! CLI definition and dispatch.
//!
//! Every analysis subcommand loads daily bars through the cached CSV store,
//! runs the core and prints the typed result as pretty JSON on stdout.

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

use crate::adapters::cached_data_port::CachedDataPort;
use crate::adapters::csv_store::{read_bars, CsvStore};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_cache::MemoryCache;
use crate::domain::config_validation::{load_app_config, AnalysisConfig, AppConfig};
use crate::domain::daily_signals::{
    analyze_buy_signals, analyze_sell_signals, BuyContext, BuySignals, SellContext, SellSignals,
};
use crate::domain::error::{AnalysisError, EtfError};
use crate::domain::indicator::{boll_k_x100, calculate_ma, IndicatorType};
use crate::domain::indicator_helpers::compute_indicator;
use crate::domain::levels::{find_support_resistance, Levels};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::pattern::Timeframe;
use crate::domain::performance::{
    check_symbol_count, comparison_row, price_info, rank_entry, rank_performance, ComparisonRow,
    PriceInfo, RankPeriod, Ranking, MAX_BATCH_SYMBOLS, MAX_COMPARE_SYMBOLS, MIN_COMPARE_SYMBOLS,
};
use crate::domain::resample::resample_to_weekly;
use crate::domain::series::{last, tail};
use crate::domain::signal::{IndicatorSnapshot, SignalSet};
use crate::domain::trend_report::{analyze_trend_from_daily, TrendReport};
use crate::domain::weekly_trend::{analyze_weekly_trend, WeeklyTrend};
use crate::ports::cache_port::CachePort;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "etfscope", about = "Technical analysis for ETF and index price series")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Overrides `[data] dir`
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Last date of the analysed history (defaults to today)
    #[arg(long, global = true)]
    pub end: Option<NaiveDate>,
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Indicator series for one symbol
    Indicators {
        symbol: String,
        /// e.g. `MA(20)`, `MACD(12,26,9)`, `BOLL(20,2)`; repeatable
        #[arg(short, long = "indicator")]
        indicators: Vec<String>,
        /// Number of trailing rows to print
        #[arg(long, default_value_t = 5)]
        rows: usize,
        #[arg(long)]
        weekly: bool,
    },
    /// Latest indicator snapshot with bullish/bearish signals
    Signals {
        symbol: String,
        #[arg(long)]
        weekly: bool,
    },
    /// Multi-horizon weekly trend report
    Trend { symbol: String },
    /// Weekly trend classification with support/resistance
    WeeklyTrend { symbol: String },
    /// Daily buy-signal strength
    Buy { symbol: String },
    /// Daily sell-signal strength
    Sell {
        symbol: String,
        #[arg(long)]
        entry_price: Option<f64>,
    },
    /// Support and resistance levels
    Levels {
        symbol: String,
        /// Use daily instead of weekly bars
        #[arg(long)]
        daily: bool,
    },
    /// Side-by-side comparison of several symbols
    Compare {
        symbols: Vec<String>,
        /// Allow a single symbol and up to ten
        #[arg(long)]
        batch: bool,
    },
    /// Top gainers and losers across every stored symbol
    Rank {
        /// day, week or month
        #[arg(long, default_value = "week")]
        period: RankPeriod,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Merge a CSV file of daily bars into the store
    Import { symbol: String, file: PathBuf },
    /// Stored date range per symbol (all symbols when none are given)
    Status { symbols: Vec<String> },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, EtfError> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            load_app_config(&FileConfigAdapter::from_file(p)?)
        }
        None => Ok(AppConfig::default()),
    }
}

fn execute(cli: Cli) -> Result<String, EtfError> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let end = cli.end.unwrap_or_else(|| Local::now().date_naive());

    let store = CsvStore::new(config.data_dir.clone());
    match &cli.command {
        Command::Import { symbol, file } => return import(&store, symbol, file),
        Command::Status { symbols } => {
            return Ok(serde_json::to_string_pretty(&store_status(&store, symbols)?)?);
        }
        _ => {}
    }

    let port = CachedDataPort::new(
        store,
        MemoryCache::new(),
        StdDuration::from_secs(config.hist_ttl_secs),
    );
    let value = execute_with(&port, &config, end, &cli.command)?;
    debug!(cache = ?port.cache().stats(), "done");
    Ok(serde_json::to_string_pretty(&value)?)
}

fn import(store: &CsvStore, symbol: &str, file: &Path) -> Result<String, EtfError> {
    let bars = read_bars(file)?;
    let imported = bars.len();
    let stored = store.upsert(symbol, bars)?;
    Ok(serde_json::to_string_pretty(&ImportReport {
        symbol: symbol.to_string(),
        imported,
        stored,
    })?)
}

#[derive(Debug, Serialize)]
struct ImportReport {
    symbol: String,
    imported: usize,
    stored: usize,
}

#[derive(Debug, Serialize)]
pub struct StoredRange {
    pub symbol: String,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
    pub bars: usize,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub data_dir: PathBuf,
    pub symbols: Vec<StoredRange>,
}

/// Date range held for each symbol; an empty list means every stored symbol.
pub fn store_status(store: &CsvStore, symbols: &[String]) -> Result<StoreStatus, EtfError> {
    let symbols = if symbols.is_empty() {
        store.list_symbols()?
    } else {
        symbols.to_vec()
    };
    let mut ranges = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let range = store.data_range(&symbol)?;
        ranges.push(StoredRange {
            first: range.map(|(first, _, _)| first),
            last: range.map(|(_, last, _)| last),
            bars: range.map_or(0, |(_, _, n)| n),
            symbol,
        });
    }
    Ok(StoreStatus {
        data_dir: store.base_path().to_path_buf(),
        symbols: ranges,
    })
}

#[derive(Debug, Serialize)]
pub struct IndicatorsReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub price: PriceInfo,
    pub dates: Vec<NaiveDate>,
    pub indicators: Vec<IndicatorColumns>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorColumns {
    pub name: String,
    pub components: BTreeMap<&'static str, Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct SignalsReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub snapshot: IndicatorSnapshot,
    pub signals: SignalSet,
}

#[derive(Debug, Serialize)]
pub struct WeeklyTrendReport {
    pub symbol: String,
    pub trend: WeeklyTrend,
    pub levels: Levels,
}

#[derive(Debug, Serialize)]
pub struct BuyReport {
    pub symbol: String,
    pub weekly_support: Option<f64>,
    pub weekly_ma20: Option<f64>,
    pub result: BuySignals,
}

#[derive(Debug, Serialize)]
pub struct SellReport {
    pub symbol: String,
    pub entry_price: Option<f64>,
    pub weekly_resistance: Option<f64>,
    pub result: SellSignals,
}

#[derive(Debug, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Serialize)]
pub struct RankingReport {
    #[serde(flatten)]
    pub ranking: Ranking,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Serialize)]
pub struct TrendCommandReport {
    pub symbol: String,
    #[serde(flatten)]
    pub report: TrendReport,
}

/// Run an analysis command against any data source and return its JSON value.
pub fn execute_with(
    port: &dyn MarketDataPort,
    config: &AppConfig,
    end: NaiveDate,
    command: &Command,
) -> Result<serde_json::Value, EtfError> {
    let history = History { port, config, end };
    let analysis = &config.analysis;

    let value = match command {
        Command::Indicators {
            symbol,
            indicators,
            rows,
            weekly,
        } => {
            let bars = history.bars(symbol, *weekly)?;
            serde_json::to_value(indicators_report(symbol, &bars, indicators, *rows, *weekly, analysis)?)?
        }
        Command::Signals { symbol, weekly } => {
            let bars = history.bars(symbol, *weekly)?;
            let snapshot = IndicatorSnapshot::from_bars(&bars)?;
            let signals = SignalSet::from_snapshot(&snapshot);
            serde_json::to_value(SignalsReport {
                symbol: symbol.clone(),
                timeframe: timeframe(*weekly),
                snapshot,
                signals,
            })?
        }
        Command::Trend { symbol } => {
            let daily = history.daily(symbol)?;
            serde_json::to_value(TrendCommandReport {
                symbol: symbol.clone(),
                report: analyze_trend_from_daily(&daily)?,
            })?
        }
        Command::WeeklyTrend { symbol } => {
            let weekly = history.bars(symbol, true)?;
            let trend = analyze_weekly_trend(&weekly, analysis.divergence_lookback_weekly)?;
            let levels = find_support_resistance(&weekly, analysis.support_lookback)?;
            serde_json::to_value(WeeklyTrendReport {
                symbol: symbol.clone(),
                trend,
                levels,
            })?
        }
        Command::Buy { symbol } => {
            let daily = history.daily(symbol)?;
            let weekly = resample_to_weekly(&daily);
            let weekly_support = find_support_resistance(&weekly, analysis.support_lookback)
                .ok()
                .map(|l| l.nearest_support)
                .filter(|v| v.is_finite());
            let weekly_ma20 = Some(last(&calculate_ma(&weekly, 20))).filter(|v| v.is_finite());
            let ctx = BuyContext {
                weekly_support,
                weekly_ma20,
            };
            serde_json::to_value(BuyReport {
                symbol: symbol.clone(),
                weekly_support,
                weekly_ma20,
                result: analyze_buy_signals(&daily, &ctx, analysis.divergence_lookback_daily)?,
            })?
        }
        Command::Sell {
            symbol,
            entry_price,
        } => {
            let daily = history.daily(symbol)?;
            let weekly = resample_to_weekly(&daily);
            let weekly_resistance = find_support_resistance(&weekly, analysis.support_lookback)
                .ok()
                .map(|l| l.nearest_resistance)
                .filter(|v| v.is_finite());
            let ctx = SellContext {
                entry_price: *entry_price,
                weekly_resistance,
            };
            serde_json::to_value(SellReport {
                symbol: symbol.clone(),
                entry_price: *entry_price,
                weekly_resistance,
                result: analyze_sell_signals(&daily, &ctx, analysis.divergence_lookback_daily)?,
            })?
        }
        Command::Levels { symbol, daily } => {
            let bars = history.bars(symbol, !*daily)?;
            serde_json::to_value(find_support_resistance(&bars, analysis.support_lookback)?)?
        }
        Command::Compare { symbols, batch } => {
            let (min, max) = if *batch {
                (1, MAX_BATCH_SYMBOLS)
            } else {
                (MIN_COMPARE_SYMBOLS, MAX_COMPARE_SYMBOLS)
            };
            check_symbol_count(symbols, min, max)?;
            serde_json::to_value(compare(&history, symbols))?
        }
        Command::Rank { period, top } => {
            if *top == 0 {
                return Err(EtfError::InvalidArgument {
                    reason: "top must be at least 1".to_string(),
                });
            }
            serde_json::to_value(rank(&history, *period, *top)?)?
        }
        Command::Import { .. } | Command::Status { .. } => {
            return Err(EtfError::InvalidArgument {
                reason: "store commands have no analysis output".to_string(),
            });
        }
    };
    Ok(value)
}

struct History<'a> {
    port: &'a dyn MarketDataPort,
    config: &'a AppConfig,
    end: NaiveDate,
}

impl History<'_> {
    fn start(&self) -> Result<NaiveDate, EtfError> {
        Duration::try_days(self.config.history_days)
            .and_then(|span| self.end.checked_sub_signed(span))
            .ok_or_else(|| EtfError::ConfigInvalid {
                section: "data".to_string(),
                key: "history_days".to_string(),
                reason: format!(
                    "{} days before {} is outside the supported date range",
                    self.config.history_days, self.end
                ),
            })
    }

    fn daily(&self, symbol: &str) -> Result<Vec<OhlcvBar>, EtfError> {
        let start = self.start()?;
        let bars = self.port.fetch_ohlcv(symbol, start, self.end)?;
        if bars.is_empty() {
            return Err(EtfError::NoData {
                symbol: symbol.to_string(),
            });
        }
        debug!(symbol, bars = bars.len(), %start, end = %self.end, "loaded history");
        Ok(bars)
    }

    fn bars(&self, symbol: &str, weekly: bool) -> Result<Vec<OhlcvBar>, EtfError> {
        let daily = self.daily(symbol)?;
        Ok(if weekly {
            resample_to_weekly(&daily)
        } else {
            daily
        })
    }
}

fn timeframe(weekly: bool) -> Timeframe {
    if weekly {
        Timeframe::Weekly
    } else {
        Timeframe::Daily
    }
}

/// MA5/10/20/60, EMA50, RSI, MACD, KDJ, BOLL, ATR and OBV.
pub fn default_indicator_set(analysis: &AnalysisConfig) -> Vec<IndicatorType> {
    vec![
        IndicatorType::Ma { period: 5 },
        IndicatorType::Ma { period: 10 },
        IndicatorType::Ma { period: 20 },
        IndicatorType::Ma { period: 60 },
        IndicatorType::Ema { period: 50 },
        IndicatorType::Rsi {
            period: analysis.rsi_period,
        },
        IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        },
        IndicatorType::Kdj { n: 9, m1: 3, m2: 3 },
        IndicatorType::Boll {
            period: analysis.boll_period,
            // validated configs always convert
            k_x100: boll_k_x100(analysis.boll_k).unwrap_or(200),
        },
        IndicatorType::Atr { period: 14 },
        IndicatorType::Obv,
    ]
}

fn indicators_report(
    symbol: &str,
    bars: &[OhlcvBar],
    requested: &[String],
    rows: usize,
    weekly: bool,
    analysis: &AnalysisConfig,
) -> Result<IndicatorsReport, EtfError> {
    let types = if requested.is_empty() {
        default_indicator_set(analysis)
    } else {
        requested
            .iter()
            .map(|s| s.parse::<IndicatorType>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let rows = rows.max(1);
    let indicators = types
        .into_iter()
        .map(|t| {
            let series = compute_indicator(bars, t);
            let components = series
                .output
                .components()
                .into_iter()
                .map(|(name, values)| (name, tail(values, rows).to_vec()))
                .collect();
            IndicatorColumns {
                name: t.to_string(),
                components,
            }
        })
        .collect();

    Ok(IndicatorsReport {
        symbol: symbol.to_string(),
        timeframe: timeframe(weekly),
        price: price_info(bars)?,
        dates: tail(bars, rows).iter().map(|b| b.date).collect(),
        indicators,
    })
}

fn compare(history: &History<'_>, symbols: &[String]) -> ComparisonReport {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for symbol in symbols {
        let row = history
            .daily(symbol)
            .and_then(|daily| comparison_row(symbol, &daily).map_err(EtfError::from));
        match row {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    ComparisonReport { rows, skipped }
}

fn rank(history: &History<'_>, period: RankPeriod, top: usize) -> Result<RankingReport, EtfError> {
    // a bad window is a config problem, not a per-symbol one
    history.start()?;
    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    for symbol in history.port.list_symbols()? {
        let entry = history.daily(&symbol).and_then(|daily| {
            rank_entry(&symbol, &daily, period).ok_or_else(|| {
                EtfError::Analysis(AnalysisError::InsufficientData {
                    have: daily.len(),
                    need: period.bars(),
                })
            })
        });
        match entry {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(%period, ranked = entries.len(), skipped = skipped.len(), "ranked symbols");
    Ok(RankingReport {
        ranking: rank_performance(entries, period, top),
        skipped,
    })
}
