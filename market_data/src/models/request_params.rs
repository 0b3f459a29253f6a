use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

/// An inclusive range of calendar dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RequestError> {
        if start > end {
            return Err(RequestError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `end`.
    pub fn trailing(end: NaiveDate, days: u64) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The day after `end`, used by providers whose upper bound is exclusive.
    pub fn exclusive_end(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Vendor-agnostic parameters for requesting daily history of one symbol.
///
/// This is the standard input of every [`DataProvider`](crate::providers::DataProvider).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// The symbol to request (e.g., `"AAPL"`). Never empty.
    pub symbol: String,

    /// The calendar range to cover. Providers return only bars inside it.
    pub range: DateRange,
}

impl HistoryRequest {
    /// Validates and builds a request.
    ///
    /// The symbol is trimmed; whether it exists is left to the provider.
    pub fn new(
        symbol: impl AsRef<str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, RequestError> {
        let symbol = symbol.as_ref().trim();
        if symbol.is_empty() {
            return Err(RequestError::EmptySymbol);
        }
        Ok(Self {
            symbol: symbol.to_string(),
            range: DateRange::new(start, end)?,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, RequestError::InvertedRange { .. }));
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = DateRange::new(date(2024, 2, 1), date(2024, 2, 1)).unwrap();
        assert!(range.contains(date(2024, 2, 1)));
        assert!(!range.contains(date(2024, 2, 2)));
        assert_eq!(range.exclusive_end(), date(2024, 2, 2));
    }

    #[test]
    fn trailing_year() {
        let range = DateRange::trailing(date(2024, 12, 31), 365);
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 12, 31));
    }

    #[test]
    fn symbol_is_trimmed_and_required() {
        let req = HistoryRequest::new("  AAPL ", date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(req.symbol, "AAPL");
        assert!(matches!(
            HistoryRequest::new("   ", date(2024, 1, 1), date(2024, 1, 31)),
            Err(RequestError::EmptySymbol)
        ));
    }
}
