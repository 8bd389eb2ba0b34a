//! File-backed bar store: one `<SYMBOL>.csv` per symbol under a base directory,
//! header `date,open,high,low,close,volume`, ISO dates.

use crate::domain::error::EtfError;
use crate::domain::ohlcv::{normalize_bars, OhlcvBar};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Every bar stored for `symbol`, ascending. A missing file is `NoData`.
    pub fn load_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, EtfError> {
        validate_symbol(symbol)?;
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(EtfError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let bars = read_bars(&path)?;
        debug!(symbol, bars = bars.len(), path = %path.display(), "read store file");
        Ok(normalize_bars(bars))
    }

    /// Merge `bars` into the stored history. Dates already present are
    /// replaced by the incoming bar. Returns the number of bars now stored.
    pub fn upsert(&self, symbol: &str, bars: Vec<OhlcvBar>) -> Result<usize, EtfError> {
        validate_symbol(symbol)?;
        let path = self.csv_path(symbol);
        let mut merged = if path.exists() {
            read_bars(&path)?
        } else {
            Vec::new()
        };
        let incoming = bars.len();
        merged.extend(bars);
        let merged = normalize_bars(merged);

        fs::create_dir_all(&self.base_path).map_err(|e| EtfError::Storage {
            reason: format!("failed to create {}: {}", self.base_path.display(), e),
        })?;
        let tmp = path.with_extension("csv.tmp");
        write_bars(&tmp, &merged)?;
        fs::rename(&tmp, &path).map_err(|e| EtfError::Storage {
            reason: format!("failed to replace {}: {}", path.display(), e),
        })?;

        info!(symbol, incoming, stored = merged.len(), "upserted bars");
        Ok(merged.len())
    }

    /// First date, last date and bar count, or `None` when nothing is stored.
    pub fn data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EtfError> {
        match self.load_all(symbol) {
            Ok(bars) => Ok(match (bars.first(), bars.last()) {
                (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
                _ => None,
            }),
            Err(EtfError::NoData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl MarketDataPort for CsvStore {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EtfError> {
        let bars: Vec<OhlcvBar> = self
            .load_all(symbol)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EtfError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EtfError::Storage {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EtfError::Storage {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Parse a bar file with the store's header. Also used to import external files.
pub fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, EtfError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| EtfError::Storage {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut bars = Vec::new();
    for (line, result) in rdr.deserialize::<OhlcvBar>().enumerate() {
        let bar = result.map_err(|e| EtfError::Storage {
            reason: format!("{} row {}: {}", path.display(), line + 1, e),
        })?;
        bars.push(bar);
    }
    Ok(bars)
}

fn write_bars(path: &Path, bars: &[OhlcvBar]) -> Result<(), EtfError> {
    let storage = |e: csv::Error| EtfError::Storage {
        reason: format!("failed to write {}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(path).map_err(storage)?;
    for bar in bars {
        wtr.serialize(bar).map_err(storage)?;
    }
    wtr.flush()?;
    Ok(())
}

fn validate_symbol(symbol: &str) -> Result<(), EtfError> {
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        && !symbol.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(EtfError::InvalidArgument {
            reason: format!("invalid symbol '{}'", symbol),
        })
    }
}
