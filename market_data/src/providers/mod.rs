//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching daily bar history from any market data vendor (e.g., Yahoo Finance, Alpaca).
//!
//! Each concrete provider implementation handles vendor-specific API logic and
//! converts the vendor's payload into a [`TimeSeries`].
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data::models::{request_params::HistoryRequest, time_series::TimeSeries};
//! use market_data::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     fn name(&self) -> &'static str {
//!         "mine"
//!     }
//!
//!     async fn fetch_daily_bars(
//!         &self,
//!         request: &HistoryRequest,
//!     ) -> Result<TimeSeries, ProviderError> {
//!         Ok(TimeSeries::empty(&request.symbol))
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod errors;
pub mod fixture;
pub mod yahoo_chart;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};

use crate::models::{request_params::HistoryRequest, time_series::TimeSeries};

pub use errors::{ProviderError, ProviderInitError};

/// Trait for fetching daily bar history from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Short identifier used in logs (e.g., `"yahoo"`).
    fn name(&self) -> &'static str;

    /// Fetches daily bars for the given request.
    ///
    /// # Returns
    ///
    /// * `Ok(TimeSeries)` - Bars inside `request.range`, sorted ascending by date.
    /// * `Err(ProviderError)` - If the request fails. An upstream answer with no
    ///   bars at all is reported as [`ProviderError::NoData`].
    async fn fetch_daily_bars(&self, request: &HistoryRequest)
    -> Result<TimeSeries, ProviderError>;
}

/// HTTP settings shared by the REST providers.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    /// Overall per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    /// Overrides the provider's default endpoint (mainly for tests and proxies).
    pub base_url: Option<String>,
    /// Overrides the provider's default `User-Agent`.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            base_url: None,
            user_agent: None,
        }
    }
}

pub(crate) fn build_client(
    settings: &HttpSettings,
    default_user_agent: &str,
    headers: HeaderMap,
) -> Result<Client, ProviderInitError> {
    let user_agent = settings
        .user_agent
        .as_deref()
        .unwrap_or(default_user_agent);

    let client = Client::builder()
        .timeout(settings.timeout)
        .user_agent(user_agent)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<reqwest::Url, ProviderInitError> {
    reqwest::Url::parse(raw).map_err(|e| ProviderInitError::InvalidBaseUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}
