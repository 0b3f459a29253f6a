use serde::{Deserialize, Serialize};

use crate::{models::request_params::HistoryRequest, providers::ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

impl Adjustment {
    pub fn as_str(self) -> &'static str {
        match self {
            Adjustment::Raw => "raw",
            Adjustment::Split => "split",
            Adjustment::Dividend => "dividend",
            Adjustment::All => "all",
        }
    }
}

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    pub fn as_str(self) -> &'static str {
        match self {
            Feed::Sip => "sip",
            Feed::Iex => "iex",
            Feed::Otc => "otc",
        }
    }
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AlpacaBarsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    /// Page size; Alpaca caps it at 10000.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// The endpoint takes a comma-separated symbol list, so a comma inside one
/// symbol would silently turn into a multi-symbol request.
pub fn validate_symbol(symbol: &str) -> Result<(), ProviderError> {
    if symbol.contains(',') {
        return Err(ProviderError::Validation(format!(
            "symbol '{symbol}' must not contain a comma"
        )));
    }
    Ok(())
}

pub fn construct_params(
    request: &HistoryRequest,
    params: &AlpacaBarsParams,
) -> Vec<(String, String)> {
    let mut query = vec![
        ("symbols".to_string(), request.symbol.to_ascii_uppercase()),
        ("timeframe".to_string(), "1Day".to_string()),
        ("start".to_string(), request.start().format("%Y-%m-%d").to_string()),
        ("end".to_string(), request.end().format("%Y-%m-%d").to_string()),
        ("sort".to_string(), "asc".to_string()),
    ];
    if let Some(adjustment) = params.adjustment {
        query.push(("adjustment".to_string(), adjustment.as_str().to_string()));
    }
    if let Some(feed) = params.feed {
        query.push(("feed".to_string(), feed.as_str().to_string()));
    }
    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.min(10_000).to_string()));
    }
    query
}
