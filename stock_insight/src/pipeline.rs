//! The forward pipeline: fetch, then derive, summarize and correlate.

use std::{num::NonZeroUsize, sync::Arc};

use anyhow::Context;
use market_data::{
    cache::FetchCache,
    fetcher::{Fetched, Fetcher, RetrievalFailure},
    models::{
        request_params::{DateRange, HistoryRequest},
        time_series::TimeSeries,
    },
};
use price_analytics::{
    CorrelationMatrix, MovingAverageSeries, SummaryStatistics, correlate, moving_average,
    summarize,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, build_provider};

/// The two moving-average windows, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub short: NonZeroUsize,
    pub long: NonZeroUsize,
}

/// How the series behind a report was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalStatus {
    Fetched { from_cache: bool, attempts: u32 },
    Failed { message: String, attempts: u32 },
}

impl From<&Fetched> for RetrievalStatus {
    fn from(fetched: &Fetched) -> Self {
        RetrievalStatus::Fetched {
            from_cache: fetched.from_cache,
            attempts: fetched.attempts,
        }
    }
}

impl From<&RetrievalFailure> for RetrievalStatus {
    fn from(failure: &RetrievalFailure) -> Self {
        RetrievalStatus::Failed {
            message: failure.source.to_string(),
            attempts: failure.attempts,
        }
    }
}

/// Every data product of one pipeline run.
///
/// `series` is the fetched data itself; price-line, candlestick and volume
/// charts read it directly.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub symbol: String,
    pub range: DateRange,
    pub retrieval: RetrievalStatus,
    pub series: Arc<TimeSeries>,
    pub short_average: MovingAverageSeries,
    pub long_average: MovingAverageSeries,
    pub summary: SummaryStatistics,
    pub correlation: CorrelationMatrix,
}

impl InsightReport {
    pub fn is_retrieved(&self) -> bool {
        matches!(self.retrieval, RetrievalStatus::Fetched { .. })
    }
}

/// The pure half of the pipeline: every derived product over `series`.
pub fn build_report(
    request: &HistoryRequest,
    series: Arc<TimeSeries>,
    windows: Windows,
    retrieval: RetrievalStatus,
) -> InsightReport {
    InsightReport {
        symbol: request.symbol.clone(),
        range: request.range,
        retrieval,
        short_average: moving_average(&series, windows.short),
        long_average: moving_average(&series, windows.long),
        summary: summarize(&series),
        correlation: correlate(&series),
        series,
    }
}

pub struct InsightPipeline {
    fetcher: Fetcher,
    windows: Windows,
}

impl InsightPipeline {
    pub fn new(fetcher: Fetcher, windows: Windows) -> Self {
        Self { fetcher, windows }
    }

    /// Builds the provider, cache and fetcher described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = build_provider(config)?;
        let cache = Arc::new(FetchCache::new(
            config.cache_policy().context("cache configuration")?,
        ));
        let fetcher = Fetcher::new(provider, cache, config.fetch_settings());
        Ok(Self::new(fetcher, config.windows()?))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn windows(&self) -> Windows {
        self.windows
    }

    /// Fetches the series only.
    pub async fn fetch(&self, request: &HistoryRequest) -> Result<Fetched, RetrievalFailure> {
        self.fetcher.fetch(request).await
    }

    /// Runs the whole pipeline.
    ///
    /// A retrieval failure never aborts the run: the products are computed over
    /// an empty series and come back undefined, with the failure recorded in
    /// [`InsightReport::retrieval`].
    pub async fn run(&self, request: &HistoryRequest) -> InsightReport {
        let (series, retrieval) = match self.fetcher.fetch(request).await {
            Ok(fetched) => {
                let status = RetrievalStatus::from(&fetched);
                (fetched.series, status)
            }
            Err(failure) => {
                warn!(error = %failure, "continuing with an empty series");
                let status = RetrievalStatus::from(&failure);
                (Arc::new(TimeSeries::empty(&request.symbol)), status)
            }
        };

        let report = build_report(request, series, self.windows, retrieval);
        info!(
            symbol = %report.symbol,
            range = %report.range,
            rows = report.series.len(),
            retrieved = report.is_retrieved(),
            "report built"
        );
        report
    }
}
