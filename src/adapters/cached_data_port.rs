//! Read-through cache in front of another market data source.

use crate::domain::error::EtfError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::cache_port::CachePort;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

pub struct CachedDataPort<P, C> {
    inner: P,
    cache: C,
    ttl: Duration,
}

impl<P: MarketDataPort, C: CachePort> CachedDataPort<P, C> {
    pub fn new(inner: P, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

pub fn history_key(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "hist_{}_{}_{}",
        symbol,
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}

impl<P: MarketDataPort, C: CachePort> MarketDataPort for CachedDataPort<P, C> {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EtfError> {
        let key = history_key(symbol, start, end);
        if let Some(bars) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(bars);
        }
        debug!(%key, "cache miss");
        let bars = self.inner.fetch_ohlcv(symbol, start, end)?;
        self.cache.set(&key, bars.clone(), self.ttl);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EtfError> {
        self.inner.list_symbols()
    }
}
