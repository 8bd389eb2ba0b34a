//! Concrete implementations of the port traits.

pub mod cached_data_port;
pub mod csv_store;
pub mod file_config_adapter;
pub mod memory_cache;
