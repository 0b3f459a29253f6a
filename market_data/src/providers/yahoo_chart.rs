//! Yahoo Finance chart API (`/v8/finance/chart/{symbol}`).
//!
//! No credentials are needed. Daily bars come back column-wise (one array per
//! field) with Unix timestamps, and any field of any row may be `null`.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::YahooChartProvider;
