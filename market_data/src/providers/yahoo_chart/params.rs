use chrono::{Days, NaiveDate};
use reqwest::Url;

use crate::{models::request_params::HistoryRequest, providers::ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo rejects requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Builds the query string for a daily chart request.
///
/// The requested window is padded by a day on each side: bar timestamps sit at
/// the exchange's local session start, which can fall on the previous UTC day.
/// The provider trims the result back to the exact range afterwards.
pub fn construct_params(request: &HistoryRequest) -> Vec<(String, String)> {
    let period1 = unix_midnight(request.start().checked_sub_days(Days::new(1)));
    let period2 = unix_midnight(request.range.exclusive_end().checked_add_days(Days::new(1)));

    vec![
        ("period1".to_string(), period1.to_string()),
        ("period2".to_string(), period2.to_string()),
        ("interval".to_string(), "1d".to_string()),
        ("includePrePost".to_string(), "false".to_string()),
        ("events".to_string(), "history".to_string()),
    ]
}

/// Appends the symbol as a single, escaped path segment.
pub fn chart_url(base: &Url, symbol: &str) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ProviderError::Validation(format!("base URL {base} cannot take a path")))?
        .pop_if_empty()
        .push(symbol);
    Ok(url)
}

fn unix_midnight(date: Option<NaiveDate>) -> i64 {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}
