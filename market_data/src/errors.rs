use chrono::NaiveDate;
use thiserror::Error;

/// Rejections raised while building a [`HistoryRequest`](crate::models::request_params::HistoryRequest).
///
/// These are caught before any network traffic happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The ticker symbol was empty after trimming.
    #[error("ticker symbol must not be empty")]
    EmptySymbol,

    /// The start date falls after the end date.
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}
