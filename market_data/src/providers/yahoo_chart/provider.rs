use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::HeaderMap};
use tracing::debug;

use crate::{
    models::{request_params::HistoryRequest, time_series::TimeSeries},
    providers::{
        DataProvider, HttpSettings, ProviderError, ProviderInitError, build_client, parse_base_url,
        yahoo_chart::{
            params::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, chart_url, construct_params},
            response::ChartEnvelope,
        },
    },
};

pub struct YahooChartProvider {
    client: Client,
    base_url: Url,
}

impl YahooChartProvider {
    /// Creates a new Yahoo Finance provider. No credentials are required.
    pub fn new(settings: &HttpSettings) -> Result<Self, ProviderInitError> {
        let base_url = parse_base_url(settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let client = build_client(settings, DEFAULT_USER_AGENT, HeaderMap::new())?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_bars(
        &self,
        request: &HistoryRequest,
    ) -> Result<TimeSeries, ProviderError> {
        let url = chart_url(&self.base_url, &request.symbol)?;
        let response = self
            .client
            .get(url)
            .query(&construct_params(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(symbol = %request.symbol, %status, bytes = body.len(), "yahoo chart response");

        parse_chart_body(status, &body, request)
    }
}

/// Turns a raw chart response into a series trimmed to the requested range.
///
/// Yahoo reports most failures as a JSON `chart.error` object, often with a
/// 4xx status, so the body is inspected before the status code.
pub fn parse_chart_body(
    status: StatusCode,
    body: &str,
    request: &HistoryRequest,
) -> Result<TimeSeries, ProviderError> {
    let envelope = match serde_json::from_str::<ChartEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ProviderError::Api {
                status,
                message: truncate(body, 200),
            });
        }
        Err(e) => return Err(ProviderError::Decode(e)),
    };

    if let Some(error) = envelope.chart.error {
        if error.is_not_found() {
            return Err(ProviderError::NoData(request.symbol.clone()));
        }
        let status = if status.is_success() {
            StatusCode::BAD_GATEWAY
        } else {
            status
        };
        return Err(ProviderError::Api {
            status,
            message: error.message(),
        });
    }
    if !status.is_success() {
        return Err(ProviderError::Api {
            status,
            message: truncate(body, 200),
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(request.symbol.clone()))?;

    let mut series = TimeSeries::new(&request.symbol, result.into_bars());
    series.retain_range(&request.range);

    if series.is_empty() {
        return Err(ProviderError::NoData(request.symbol.clone()));
    }
    Ok(series)
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
