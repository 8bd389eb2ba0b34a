//! Key/value cache for fetched bar history.

use crate::domain::ohlcv::OhlcvBar;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub trait CachePort {
    /// A live entry, or `None` when missing or expired.
    fn get(&self, key: &str) -> Option<Vec<OhlcvBar>>;
    fn set(&self, key: &str, bars: Vec<OhlcvBar>, ttl: Duration);
    fn clear(&self);
    fn stats(&self) -> CacheStats;
}
