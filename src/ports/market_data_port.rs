//! Market data source.

use crate::domain::error::EtfError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Daily bars for `symbol` with `start <= date <= end`, ascending by date.
    /// An unknown symbol is `EtfError::NoData`.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EtfError>;

    fn list_symbols(&self) -> Result<Vec<String>, EtfError>;
}
