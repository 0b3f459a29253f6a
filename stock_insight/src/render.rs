//! Plain-text digest of an [`InsightReport`].

use std::fmt::Write;

use market_data::models::bar::Column;
use price_analytics::{Metric, MovingAverageSeries};

use crate::pipeline::{InsightReport, RetrievalStatus};

fn metric_text<T: Copy>(metric: &Metric<T>, show: impl Fn(T) -> String) -> String {
    match metric {
        Metric::Defined(v) => show(*v),
        Metric::Undefined(reason) => reason.describe(),
    }
}

fn average_text(average: &MovingAverageSeries) -> String {
    match (average.latest(), average.undefined_reason()) {
        (Some(v), _) => format!("{v:.2}"),
        (None, Some(reason)) => reason.describe(),
        (None, None) => "no data".to_string(),
    }
}

/// Renders the report as a short human-readable summary.
pub fn render_text(report: &InsightReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{} {}", report.symbol, report.range);
    let _ = match &report.retrieval {
        RetrievalStatus::Fetched {
            from_cache: true, ..
        } => writeln!(out, "  retrieval       cached"),
        RetrievalStatus::Fetched { attempts, .. } => {
            writeln!(out, "  retrieval       fetched ({attempts} attempt(s))")
        }
        RetrievalStatus::Failed { message, attempts } => {
            writeln!(out, "  retrieval       failed after {attempts} attempt(s): {message}")
        }
    };

    let span = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!(" ({first} to {last})"),
        _ => String::new(),
    };
    let _ = writeln!(out, "  trading days    {}{span}", summary.trading_days);
    let _ = writeln!(
        out,
        "  latest close    {}",
        metric_text(&summary.latest_close, |v| format!("{v:.2}"))
    );
    let _ = writeln!(
        out,
        "  change          {} ({})",
        metric_text(&summary.absolute_change, |v| format!("{v:+.2}")),
        metric_text(&summary.percent_change, |v| format!("{v:+.2}%"))
    );
    let _ = writeln!(
        out,
        "  average volume  {}",
        metric_text(&summary.average_volume, |v| format!("{v:.0}"))
    );
    let _ = writeln!(
        out,
        "  max volume      {}",
        metric_text(&summary.max_volume, |v| v.to_string())
    );
    for average in [&report.short_average, &report.long_average] {
        let label = format!("SMA {}", average.window);
        let _ = writeln!(out, "  {label:<16}{}", average_text(average));
    }

    let _ = writeln!(out, "  correlation");
    let _ = write!(out, "  {:<8}", "");
    for column in Column::ALL {
        let _ = write!(out, "{:>8}", column.as_str());
    }
    let _ = writeln!(out);
    for row in Column::ALL {
        let _ = write!(out, "  {:<8}", row.as_str());
        for column in Column::ALL {
            let cell = match report.correlation.get(row, column) {
                Metric::Defined(v) => format!("{v:.2}"),
                Metric::Undefined(_) => "n/a".to_string(),
            };
            let _ = write!(out, "{cell:>8}");
        }
        let _ = writeln!(out);
    }
    if let Some(reason) = report.correlation.undefined_reason() {
        let _ = writeln!(out, "  n/a: {}", reason.describe());
    }
    out
}

#[cfg(test)]
mod tests {
    use std::{num::NonZeroUsize, sync::Arc};

    use chrono::NaiveDate;
    use market_data::models::{
        bar::DailyBar, request_params::HistoryRequest, time_series::TimeSeries,
    };

    use super::*;
    use crate::pipeline::{Windows, build_report};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn windows() -> Windows {
        Windows {
            short: NonZeroUsize::new(2).unwrap(),
            long: NonZeroUsize::new(200).unwrap(),
        }
    }

    #[test]
    fn digest_shows_values_and_reasons() {
        let request = HistoryRequest::new("TEST", date(3), date(5)).unwrap();
        let series = TimeSeries::new(
            "TEST",
            vec![
                DailyBar::new(date(3), 100.0, 100.0, 100.0, 100.0, 1_000),
                DailyBar::new(date(4), 110.0, 110.0, 110.0, 110.0, 2_000),
                DailyBar::new(date(5), 121.0, 121.0, 121.0, 121.0, 3_000),
            ],
        );
        let report = build_report(
            &request,
            Arc::new(series),
            windows(),
            RetrievalStatus::Fetched {
                from_cache: false,
                attempts: 1,
            },
        );
        let text = render_text(&report);

        assert!(text.starts_with("TEST 2024-06-03..=2024-06-05"));
        assert!(text.contains("fetched (1 attempt(s))"));
        assert!(text.contains("latest close    121.00"));
        assert!(text.contains("+21.00 (+21.00%)"));
        assert!(text.contains("max volume      3000"));
        assert!(text.contains("SMA 2"));
        assert!(text.contains("115.50"));
        assert!(text.contains("not enough data (3 of 200 rows)"));
    }

    #[test]
    fn failed_retrieval_is_spelled_out() {
        let request = HistoryRequest::new("NOPE", date(3), date(5)).unwrap();
        let report = build_report(
            &request,
            Arc::new(TimeSeries::empty("NOPE")),
            windows(),
            RetrievalStatus::Failed {
                message: "no data returned for NOPE".into(),
                attempts: 1,
            },
        );
        let text = render_text(&report);

        assert!(text.contains("failed after 1 attempt(s)"));
        assert!(text.contains("latest close    no data"));
        assert!(text.contains("n/a: not enough data (0 of 2 rows)"));
    }
}
