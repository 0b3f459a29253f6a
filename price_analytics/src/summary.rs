//! Headline statistics over a whole series.

use chrono::NaiveDate;
use market_data::models::{bar::Column, time_series::TimeSeries};
use serde::Serialize;
use tracing::debug;

use crate::metric::{Metric, Undefined};

/// The fixed record of summary statistics for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    /// Number of bars in the series.
    pub trading_days: usize,
    /// Date of the first bar.
    pub first_date: Option<NaiveDate>,
    /// Date of the last bar.
    pub last_date: Option<NaiveDate>,
    /// Close of the last bar that has one.
    pub latest_close: Metric<f64>,
    /// Latest close minus the first close.
    pub absolute_change: Metric<f64>,
    /// `absolute_change` relative to the first close, in percent.
    pub percent_change: Metric<f64>,
    /// Mean of the present volumes.
    pub average_volume: Metric<f64>,
    /// Largest present volume.
    pub max_volume: Metric<u64>,
}

/// Computes the summary record.
///
/// "First" and "latest" close skip bars with a missing close. An empty series
/// yields every metric as [`Undefined::EmptySeries`]; a first close of exactly
/// zero leaves `percent_change` as [`Undefined::ZeroBasePrice`], and a first
/// close so small that the ratio overflows leaves it as [`Undefined::NonFinite`].
pub fn summarize(series: &TimeSeries) -> SummaryStatistics {
    let no_value = |column: Column| {
        if series.is_empty() {
            Undefined::EmptySeries
        } else {
            Undefined::MissingValues { column }
        }
    };

    let mut closes = series.closes().flatten();
    let first_close = closes.next();
    let last_close = closes.next_back().or(first_close);

    let first_close = Metric::from_option(first_close, no_value(Column::Close));
    let latest_close = Metric::from_option(last_close, no_value(Column::Close));

    let absolute_change = match (latest_close, first_close) {
        (Metric::Defined(last), Metric::Defined(first)) => Metric::Defined(last - first),
        (Metric::Undefined(reason), _) | (_, Metric::Undefined(reason)) => {
            Metric::Undefined(reason)
        }
    };

    let percent_change = match (absolute_change, first_close) {
        (Metric::Defined(_), Metric::Defined(first)) if first == 0.0 => {
            Metric::Undefined(Undefined::ZeroBasePrice)
        }
        (Metric::Defined(change), Metric::Defined(first)) => {
            let percent = change / first * 100.0;
            if percent.is_finite() {
                Metric::Defined(percent)
            } else {
                Metric::Undefined(Undefined::NonFinite)
            }
        }
        (Metric::Undefined(reason), _) | (_, Metric::Undefined(reason)) => {
            Metric::Undefined(reason)
        }
    };

    let volumes: Vec<u64> = series.bars().iter().filter_map(|b| b.volume).collect();
    let average_volume = if volumes.is_empty() {
        Metric::Undefined(no_value(Column::Volume))
    } else {
        let total: f64 = volumes.iter().map(|&v| v as f64).sum();
        Metric::Defined(total / volumes.len() as f64)
    };
    let max_volume = Metric::from_option(volumes.iter().copied().max(), no_value(Column::Volume));

    debug!(symbol = %series.symbol, rows = series.len(), "summary computed");

    SummaryStatistics {
        trading_days: series.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        latest_close,
        absolute_change,
        percent_change,
        average_volume,
        max_volume,
    }
}
