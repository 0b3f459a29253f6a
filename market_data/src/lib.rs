//! Daily market data retrieval.
//!
//! The crate is organised leaf-first:
//! - [`models`]: the vendor-agnostic data model ([`DailyBar`](models::bar::DailyBar),
//!   [`TimeSeries`](models::time_series::TimeSeries), [`HistoryRequest`](models::request_params::HistoryRequest)).
//! - [`providers`]: the [`DataProvider`](providers::DataProvider) trait and its implementations.
//! - [`cache`]: the fetch memoization cache.
//! - [`fetcher`]: ties a provider and a cache together with a timeout and a bounded retry.

pub mod cache;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod providers;
