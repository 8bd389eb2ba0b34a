//! etfscope — technical analysis for ETF and index price series.
//!
//! Hexagonal layout: the analysis core in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and the command-line front end in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
