use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::models::bar::DailyBar;

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ChartError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("not found")
    }

    pub fn message(&self) -> String {
        match &self.description {
            Some(d) => format!("{}: {}", self.code, d),
            None => self.code.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the range holds no trading days.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(rename = "gmtoffset", default)]
    pub gmt_offset: i64,
    #[serde(rename = "exchangeTimezoneName", default)]
    pub exchange_timezone_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
}

#[derive(Deserialize, Debug, Default)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zips the column arrays into rows, one per timestamp.
    ///
    /// Columns shorter than the timestamp array read as missing values.
    pub fn into_bars(self) -> Vec<DailyBar> {
        let tz = self
            .meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok());
        let gmt_offset = self.meta.gmt_offset;
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();

        let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = session_date(ts, tz, gmt_offset)?;
                Some(DailyBar {
                    date,
                    open: at(&quote.open, i),
                    high: at(&quote.high, i),
                    low: at(&quote.low, i),
                    close: at(&quote.close, i),
                    volume: at(&quote.volume, i)
                        .filter(|v| v.is_finite() && *v >= 0.0)
                        .map(|v| v.round() as u64),
                })
            })
            .collect()
    }
}

/// The trading day a session timestamp belongs to, in the exchange's calendar.
///
/// Prefers the named exchange time zone (DST-aware); falls back to the fixed
/// offset Yahoo reports for the current session.
fn session_date(ts: i64, tz: Option<Tz>, gmt_offset: i64) -> Option<NaiveDate> {
    match tz {
        Some(tz) => tz.timestamp_opt(ts, 0).single().map(|dt| dt.date_naive()),
        None => DateTime::from_timestamp(ts.checked_add(gmt_offset)?, 0).map(|dt| dt.date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_zipped_with_nulls_preserved() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL", "gmtoffset": -18000, "exchangeTimezoneName": "America/New_York"},
                    "timestamp": [1704205800, 1704292200],
                    "indicators": {"quote": [{
                        "open":   [187.15, null],
                        "high":   [188.44, 185.88],
                        "low":    [183.89, 183.43],
                        "close":  [185.64, 184.25],
                        "volume": [82488700, null]
                    }]}
                }],
                "error": null
            }
        }"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        let result = envelope.chart.result.unwrap().into_iter().next().unwrap();
        let bars = result.into_bars();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].volume, Some(82_488_700));
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].open, None);
        assert_eq!(bars[1].volume, None);
        assert_eq!(bars[1].close, Some(184.25));
    }

    #[test]
    fn fixed_offset_is_used_without_zone_name() {
        // 2024-01-04T15:00:00Z is already Jan 5th in Tokyo (+9h).
        assert_eq!(
            session_date(1704380400, None, 9 * 3600),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn overflowing_offset_yields_no_date() {
        assert_eq!(session_date(i64::MAX - 10, None, 3600), None);
        assert_eq!(session_date(i64::MIN + 10, None, -3600), None);
    }

    #[test]
    fn error_payload_parses() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        let err = envelope.chart.error.unwrap();
        assert!(err.is_not_found());
        assert!(err.message().contains("delisted"));
    }
}
