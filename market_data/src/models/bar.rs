//! Canonical in-memory representation of one trading day (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation, regardless of which vendor the data came from.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar.
///
/// Every value field is optional: upstream sources occasionally publish a row
/// with null prices (a trading halt, a late correction). Missing values are
/// kept as `None` instead of being filled with a guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// The trading day this bar covers, in the exchange's calendar.
    pub date: NaiveDate,

    /// Opening price.
    #[serde(default)]
    pub open: Option<f64>,

    /// Highest price of the day.
    #[serde(default)]
    pub high: Option<f64>,

    /// Lowest price of the day.
    #[serde(default)]
    pub low: Option<f64>,

    /// Closing price.
    #[serde(default)]
    pub close: Option<f64>,

    /// Number of shares traded.
    #[serde(default)]
    pub volume: Option<u64>,
}

impl DailyBar {
    /// Builds a bar with every field present.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Returns the value of `column` as a float, if present.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Open => self.open,
            Column::High => self.high,
            Column::Low => self.low,
            Column::Close => self.close,
            Column::Volume => self.volume.map(|v| v as f64),
        }
    }

    /// Replaces negative prices with `None`, returning the columns that were cleared.
    pub(crate) fn discard_negative_prices(&mut self) -> Vec<Column> {
        let mut cleared = Vec::new();
        for (column, slot) in [
            (Column::Open, &mut self.open),
            (Column::High, &mut self.high),
            (Column::Low, &mut self.low),
            (Column::Close, &mut self.close),
        ] {
            if slot.is_some_and(|v| v < 0.0 || !v.is_finite()) {
                *slot = None;
                cleared.push(column);
            }
        }
        cleared
    }
}

/// The five numeric columns of a daily bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    /// All columns in their canonical order.
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    /// Position of the column inside [`Column::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn value_reads_each_column() {
        let bar = DailyBar::new(day(2), 1.0, 2.0, 0.5, 1.5, 900);
        assert_eq!(bar.value(Column::Open), Some(1.0));
        assert_eq!(bar.value(Column::High), Some(2.0));
        assert_eq!(bar.value(Column::Low), Some(0.5));
        assert_eq!(bar.value(Column::Close), Some(1.5));
        assert_eq!(bar.value(Column::Volume), Some(900.0));
    }

    #[test]
    fn column_index_matches_canonical_order() {
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index(), i);
        }
    }

    #[test]
    fn negative_and_non_finite_prices_are_cleared() {
        let mut bar = DailyBar::new(day(3), -1.0, 2.0, f64::NAN, 1.5, 10);
        let cleared = bar.discard_negative_prices();
        assert_eq!(cleared, vec![Column::Open, Column::Low]);
        assert_eq!(bar.open, None);
        assert_eq!(bar.low, None);
        assert_eq!(bar.high, Some(2.0));
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let bar: DailyBar = serde_json::from_str(r#"{"date":"2024-01-02","close":10.5}"#).unwrap();
        assert_eq!(bar.close, Some(10.5));
        assert_eq!(bar.open, None);
        assert_eq!(bar.volume, None);
    }
}
