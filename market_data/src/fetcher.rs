//! The data fetcher: cache lookup, then a provider call bounded by a timeout,
//! with one (configurable) retry for transient failures.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheKey, FetchCache},
    models::{
        request_params::{DateRange, HistoryRequest},
        time_series::TimeSeries,
    },
    providers::{DataProvider, ProviderError},
};

/// Retry behaviour for transient provider failures.
///
/// Delays grow exponentially: `base_delay * 2^retry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchSettings {
    /// Upper bound for one provider call; expiry counts as a retryable failure.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// A successfully fetched series.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub series: Arc<TimeSeries>,
    /// `true` when no provider call was made.
    pub from_cache: bool,
    /// Provider calls made; 0 on a cache hit.
    pub attempts: u32,
}

/// The upstream source could not deliver data for the request.
#[derive(Debug, Error)]
#[error("failed to retrieve {symbol} for {range} after {attempts} attempt(s): {source}")]
pub struct RetrievalFailure {
    pub symbol: String,
    pub range: DateRange,
    pub attempts: u32,
    #[source]
    pub source: ProviderError,
}

pub struct Fetcher {
    provider: Box<dyn DataProvider>,
    cache: Arc<FetchCache>,
    settings: FetchSettings,
}

impl Fetcher {
    pub fn new(
        provider: Box<dyn DataProvider>,
        cache: Arc<FetchCache>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn settings(&self) -> FetchSettings {
        self.settings
    }

    /// Fetches daily bars for `request`, consulting the cache first.
    ///
    /// Only successful, non-empty results are cached.
    pub async fn fetch(&self, request: &HistoryRequest) -> Result<Fetched, RetrievalFailure> {
        let key = CacheKey::from(request);
        if let Some(series) = self.cache.get(&key) {
            debug!(symbol = %request.symbol, range = %request.range, "cache hit");
            return Ok(Fetched {
                series,
                from_cache: true,
                attempts: 0,
            });
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.fetch_once(request).await {
                Ok(series) => {
                    info!(
                        provider = self.provider.name(),
                        symbol = %request.symbol,
                        range = %request.range,
                        bars = series.len(),
                        attempts,
                        "fetched daily bars"
                    );
                    let series = Arc::new(series);
                    self.cache.insert(key, Arc::clone(&series));
                    return Ok(Fetched {
                        series,
                        from_cache: false,
                        attempts,
                    });
                }
                Err(e) if e.is_retryable() && attempts <= self.settings.retry.max_retries => {
                    let delay = self.settings.retry.delay_for(attempts - 1);
                    warn!(
                        provider = self.provider.name(),
                        symbol = %request.symbol,
                        error = %e,
                        ?delay,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        symbol = %request.symbol,
                        error = %e,
                        attempts,
                        "retrieval failed"
                    );
                    return Err(RetrievalFailure {
                        symbol: request.symbol.clone(),
                        range: request.range,
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }

    async fn fetch_once(&self, request: &HistoryRequest) -> Result<TimeSeries, ProviderError> {
        let mut series =
            tokio::time::timeout(self.settings.timeout, self.provider.fetch_daily_bars(request))
                .await
                .map_err(|_| ProviderError::Timeout(self.settings.timeout))??;

        // Providers are trusted to trim, but the range contract is enforced here.
        series.retain_range(&request.range);
        if series.is_empty() {
            return Err(ProviderError::NoData(request.symbol.clone()));
        }
        Ok(series)
    }
}
