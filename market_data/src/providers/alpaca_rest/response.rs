use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::DailyBar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: u64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl AlpacaBar {
    /// Daily bars are stamped at midnight New York time; the date is taken there.
    pub fn into_daily_bar(self) -> DailyBar {
        DailyBar::new(
            self.timestamp.with_timezone(&New_York).date_naive(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    /// `null` when no symbol had bars in the range.
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    pub next_page_token: Option<String>,
}

impl AlpacaResponse {
    /// Removes and converts the bars of `symbol`.
    ///
    /// Alpaca keys the map by the upper-case symbol whatever case was sent.
    pub fn take_daily_bars(&mut self, symbol: &str) -> Vec<DailyBar> {
        self.bars
            .as_mut()
            .and_then(|by_symbol| by_symbol.swap_remove(&symbol.to_ascii_uppercase()))
            .unwrap_or_default()
            .into_iter()
            .map(AlpacaBar::into_daily_bar)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn daily_bar_date_is_new_york_calendar_day() {
        let json = r#"{
            "bars": {"AAPL": [
                {"t": "2024-01-02T05:00:00Z", "o": 187.15, "h": 188.44, "l": 183.89, "c": 185.64, "v": 82488700, "n": 1009074, "vw": 185.9}
            ]},
            "next_page_token": null
        }"#;
        let response: AlpacaResponse = serde_json::from_str(json).unwrap();
        let mut bars = response.bars.unwrap();
        let bar = bars.swap_remove("AAPL").unwrap().remove(0).into_daily_bar();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bar.close, Some(185.64));
        assert_eq!(bar.volume, Some(82_488_700));
    }

    #[test]
    fn null_bars_parse() {
        let mut response: AlpacaResponse =
            serde_json::from_str(r#"{"bars": null, "next_page_token": null}"#).unwrap();
        assert!(response.bars.is_none());
        assert!(response.take_daily_bars("AAPL").is_empty());
    }

    #[test]
    fn bars_are_found_whatever_the_requested_case() {
        let json = r#"{
            "bars": {"MSFT": [
                {"t": "2024-01-02T05:00:00Z", "o": 370.0, "h": 375.0, "l": 366.5, "c": 370.87, "v": 25258600}
            ]},
            "next_page_token": "abc"
        }"#;
        let mut response: AlpacaResponse = serde_json::from_str(json).unwrap();
        let bars = response.take_daily_bars("msft");
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, Some(370.87));
        assert!(response.take_daily_bars("msft").is_empty());
    }
}
