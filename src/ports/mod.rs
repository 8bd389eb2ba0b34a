//! Port traits at the I/O boundary.

pub mod cache_port;
pub mod config_port;
pub mod market_data_port;
