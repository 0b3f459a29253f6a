//! An ordered set of daily bars for a single symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{
    bar::{Column, DailyBar},
    request_params::DateRange,
};

/// Represents a complete set of daily data for a single symbol.
///
/// Bars are always sorted ascending by date with at most one bar per date;
/// [`TimeSeries::new`] enforces this no matter what order the provider used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTimeSeries")]
pub struct TimeSeries {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    bars: Vec<DailyBar>,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    symbol: String,
    #[serde(default)]
    bars: Vec<DailyBar>,
}

impl From<RawTimeSeries> for TimeSeries {
    fn from(raw: RawTimeSeries) -> Self {
        TimeSeries::new(raw.symbol, raw.bars)
    }
}

impl TimeSeries {
    /// Builds a series, sorting bars by date and collapsing duplicate dates.
    ///
    /// When two bars share a date the one that came later in `bars` wins.
    /// Negative prices are cleared to `None`.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<DailyBar>) -> Self {
        let symbol = symbol.into();
        bars.sort_by_key(|b| b.date);

        let mut out: Vec<DailyBar> = Vec::with_capacity(bars.len());
        for mut bar in bars {
            let cleared = bar.discard_negative_prices();
            if !cleared.is_empty() {
                warn!(%symbol, date = %bar.date, ?cleared, "discarded invalid prices");
            }
            match out.last_mut() {
                Some(last) if last.date == bar.date => {
                    warn!(%symbol, date = %bar.date, "duplicate date, keeping latest bar");
                    *last = bar;
                }
                _ => out.push(bar),
            }
        }

        Self { symbol, bars: out }
    }

    /// A series with no bars.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// The dates of every bar, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    /// The closing prices of every bar, in order.
    pub fn closes(&self) -> impl DoubleEndedIterator<Item = Option<f64>> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    /// The values of `column` for every bar, in order.
    pub fn column(&self, column: Column) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.value(column)).collect()
    }

    /// Drops every bar whose date falls outside `range`.
    pub fn retain_range(&mut self, range: &DateRange) {
        self.bars.retain(|b| range.contains(b.date));
    }

    /// Returns a copy holding only the bars inside `range`.
    pub fn within(&self, range: &DateRange) -> TimeSeries {
        let mut copy = self.clone();
        copy.retain_range(range);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> DailyBar {
        DailyBar::new(day(d), close, close, close, close, 100)
    }

    #[test]
    fn bars_are_sorted_and_deduplicated() {
        let series = TimeSeries::new(
            "AAPL",
            vec![bar(5, 3.0), bar(1, 1.0), bar(4, 2.0), bar(5, 4.0)],
        );
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![day(1), day(4), day(5)]);
        assert_eq!(series.bars()[2].close, Some(4.0));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn retain_range_is_inclusive() {
        let mut series = TimeSeries::new("MSFT", (1..=10).map(|d| bar(d, d as f64)).collect());
        let range = DateRange::new(day(3), day(5)).unwrap();
        series.retain_range(&range);
        assert_eq!(series.first_date(), Some(day(3)));
        assert_eq!(series.last_date(), Some(day(5)));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn deserializing_normalizes_order() {
        let json = r#"{
            "symbol": "IBM",
            "bars": [
                {"date": "2024-03-02", "close": 2.0},
                {"date": "2024-03-01", "close": 1.0}
            ]
        }"#;
        let series: TimeSeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.first_date(), Some(day(1)));
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn closes_can_be_read_from_both_ends() {
        let series = TimeSeries::new("AAPL", vec![bar(1, 1.0), bar(2, 2.0), bar(3, 3.0)]);
        let mut closes = series.closes().flatten();
        assert_eq!(closes.next(), Some(1.0));
        assert_eq!(closes.next_back(), Some(3.0));
        assert_eq!(closes.next(), Some(2.0));
        assert_eq!(closes.next_back(), None);
    }

    #[test]
    fn empty_series_has_no_dates() {
        let series = TimeSeries::empty("X");
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
        assert!(series.column(Column::Volume).is_empty());
    }
}
