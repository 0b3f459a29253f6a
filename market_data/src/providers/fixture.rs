//! Offline provider serving previously saved series from a JSON file.
//!
//! The file holds an array of series, the same shape `stock-insight series`
//! prints:
//!
//! ```json
//! [{"symbol": "AAPL", "bars": [{"date": "2024-01-02", "open": 187.15, "high": 188.44,
//!   "low": 183.89, "close": 185.64, "volume": 82488700}]}]
//! ```

use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    models::{request_params::HistoryRequest, time_series::TimeSeries},
    providers::{DataProvider, ProviderError, ProviderInitError},
};

pub struct FixtureProvider {
    series: IndexMap<String, TimeSeries>,
}

impl FixtureProvider {
    pub fn from_series(series: impl IntoIterator<Item = TimeSeries>) -> Self {
        let series = series
            .into_iter()
            .map(|s| (s.symbol.to_ascii_uppercase(), s))
            .collect();
        Self { series }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProviderInitError> {
        let path = path.as_ref();
        let fixture_err = |message: String| ProviderInitError::Fixture {
            path: path.display().to_string(),
            message,
        };

        let text = std::fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let series: Vec<TimeSeries> =
            serde_json::from_str(&text).map_err(|e| fixture_err(e.to_string()))?;
        Ok(Self::from_series(series))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.values().map(|s| s.symbol.as_str())
    }
}

#[async_trait]
impl DataProvider for FixtureProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_daily_bars(
        &self,
        request: &HistoryRequest,
    ) -> Result<TimeSeries, ProviderError> {
        let series = self
            .series
            .get(&request.symbol.to_ascii_uppercase())
            .map(|s| s.within(&request.range))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::NoData(request.symbol.clone()))?;
        Ok(series)
    }
}
