//! Derived data products computed over a [`TimeSeries`](market_data::models::time_series::TimeSeries).
//!
//! Every function here is pure and total: an empty or degenerate series
//! produces explicit [`Metric::Undefined`] values, never a panic or a NaN.

#![deny(missing_docs)]

pub mod correlation;
pub mod metric;
pub mod moving_average;
pub mod summary;

pub use correlation::{CorrelationMatrix, correlate};
pub use metric::{IssueKind, Metric, Undefined};
pub use moving_average::{MovingAveragePoint, MovingAverageSeries, moving_average};
pub use summary::{SummaryStatistics, summarize};
