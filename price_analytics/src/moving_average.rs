//! Trailing simple moving averages of the close price.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use market_data::models::{bar::Column, time_series::TimeSeries};
use serde::Serialize;
use tracing::debug;

use crate::metric::Undefined;

/// One entry of a [`MovingAverageSeries`], aligned with a bar of the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAveragePoint {
    /// Date of the bar this entry belongs to.
    pub date: NaiveDate,
    /// Mean close of the window ending at this bar; `None` while the window is
    /// not yet full or when it contains a missing close.
    pub value: Option<f64>,
}

/// A moving average aligned 1:1 by date with the series it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverageSeries {
    /// Window size in rows (trading days, not calendar days).
    pub window: usize,
    /// One point per input bar, in date order.
    pub points: Vec<MovingAveragePoint>,
}

impl MovingAverageSeries {
    /// Number of entries with a value.
    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// The most recent defined value.
    pub fn latest(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }

    /// The value on `date`, if the date is in the series and the value defined.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .and_then(|i| self.points[i].value)
    }

    /// Why the series has no values at all, if that is the case.
    pub fn undefined_reason(&self) -> Option<Undefined> {
        if self.points.is_empty() {
            return Some(Undefined::EmptySeries);
        }
        if self.points.len() < self.window {
            return Some(Undefined::InsufficientData {
                required: self.window,
                available: self.points.len(),
            });
        }
        if self.defined_count() == 0 {
            return Some(Undefined::MissingValues {
                column: Column::Close,
            });
        }
        None
    }
}

/// Computes the trailing arithmetic mean of close over `window` rows.
///
/// Entry `i` is the mean of closes `[i - window + 1, i]`; the first
/// `window - 1` entries are undefined. A window holding a missing close is
/// undefined too. A window longer than the series gives an all-undefined
/// result, not an error.
pub fn moving_average(series: &TimeSeries, window: NonZeroUsize) -> MovingAverageSeries {
    let window = window.get();
    let closes: Vec<Option<f64>> = series.closes().collect();

    let mut values = vec![None; closes.len()];
    if closes.len() >= window {
        for (offset, slice) in closes.windows(window).enumerate() {
            values[offset + window - 1] = slice
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|sum| sum / window as f64);
        }
    }

    let points: Vec<MovingAveragePoint> = series
        .dates()
        .zip(values)
        .map(|(date, value)| MovingAveragePoint { date, value })
        .collect();

    debug!(
        symbol = %series.symbol,
        window,
        rows = points.len(),
        "moving average computed"
    );

    MovingAverageSeries { window, points }
}
