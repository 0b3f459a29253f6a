use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use market_data::{
    errors::RequestError,
    models::request_params::{DateRange, HistoryRequest},
};
use tracing::info;

use crate::{
    config::{Config, QueryDefaults},
    pipeline::{InsightPipeline, InsightReport},
    render::render_text,
};

#[derive(Parser, Debug)]
#[command(name = "stock-insight", author, version, about = "Daily stock price insights")]
pub struct Cli {
    /// Path to the config file (falls back to $STOCK_INSIGHT_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one series and print every derived product
    Report {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Fetch one series and print it as JSON
    Series {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Read `TICKER [START END]` lines from stdin and report on each
    Session {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Ticker symbol (e.g. "AAPL")
    #[arg(long)]
    pub ticker: Option<String>,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl QueryArgs {
    /// Fills the gaps from `defaults`: the default ticker, and a range of
    /// `lookback_days` ending at `end` (or `today`).
    pub fn resolve(
        &self,
        defaults: &QueryDefaults,
        today: NaiveDate,
    ) -> Result<HistoryRequest, RequestError> {
        let ticker = self.ticker.as_deref().unwrap_or(&defaults.ticker);
        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or_else(|| DateRange::trailing(end, defaults.lookback_days).start);
        HistoryRequest::new(ticker, start, end)
    }
}

/// Parses one session line: `TICKER` or `TICKER START END`.
///
/// Blank lines and `#` comments yield `None`.
pub fn parse_session_line(
    line: &str,
    defaults: &QueryDefaults,
    today: NaiveDate,
) -> anyhow::Result<Option<HistoryRequest>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let query = match fields.as_slice() {
        [ticker] => QueryArgs {
            ticker: Some(ticker.to_string()),
            ..QueryArgs::default()
        },
        [ticker, start, end] => QueryArgs {
            ticker: Some(ticker.to_string()),
            start: Some(parse_date(start)?),
            end: Some(parse_date(end)?),
        },
        _ => bail!("expected `TICKER [START END]`, got {line:?}"),
    };
    Ok(Some(query.resolve(defaults, today)?))
}

fn parse_date(text: &str) -> anyhow::Result<NaiveDate> {
    text.parse()
        .with_context(|| format!("invalid date {text:?}, expected YYYY-MM-DD"))
}

fn write_report(
    out: &mut impl Write,
    report: &InsightReport,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json if pretty => serde_json::to_writer_pretty(&mut *out, report)?,
        OutputFormat::Json => serde_json::to_writer(&mut *out, report)?,
        OutputFormat::Text => out.write_all(render_text(report).as_bytes())?,
    }
    writeln!(out)?;
    Ok(())
}

/// Executes `cli.command`.
///
/// Reports go to `out`; `input` is only read by `session`. Rejected session
/// lines are reported on stderr and the session continues.
pub async fn run(
    cli: &Cli,
    config: &Config,
    today: NaiveDate,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let pipeline = InsightPipeline::from_config(config)?;

    match &cli.command {
        Command::Report { query, format } => {
            let request = query.resolve(&config.defaults, today)?;
            let report = pipeline.run(&request).await;
            write_report(out, &report, *format, true)?;
        }

        Command::Series { query } => {
            let request = query.resolve(&config.defaults, today)?;
            let fetched = pipeline.fetch(&request).await?;
            serde_json::to_writer_pretty(&mut *out, fetched.series.as_ref())?;
            writeln!(out)?;
        }

        Command::Session { format } => {
            let mut reports = 0usize;
            let mut rejected = 0usize;
            for (number, line) in input.lines().enumerate() {
                let line = line.context("read session input")?;
                match parse_session_line(&line, &config.defaults, today) {
                    Ok(Some(request)) => {
                        let report = pipeline.run(&request).await;
                        write_report(out, &report, *format, false)?;
                        out.flush()?;
                        reports += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        eprintln!("ERROR: line {}: {e:#}", number + 1);
                        rejected += 1;
                    }
                }
            }
            info!(
                reports,
                rejected,
                cached = pipeline.fetcher().cache().len(),
                "session finished"
            );
            // Summary goes to stderr so it doesn't interfere with parsing stdout.
            eprintln!("SUMMARY: {reports} report(s), {rejected} rejected line(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn query_defaults_to_trailing_year() {
        let today = day(2024, 12, 31);
        let request = QueryArgs::default()
            .resolve(&QueryDefaults::default(), today)
            .unwrap();
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.end(), today);
        assert_eq!(request.start(), day(2024, 1, 1));
    }

    #[test]
    fn explicit_start_after_end_is_rejected() {
        let query = QueryArgs {
            ticker: Some("MSFT".into()),
            start: Some(day(2024, 3, 2)),
            end: Some(day(2024, 3, 1)),
        };
        let err = query
            .resolve(&QueryDefaults::default(), day(2024, 12, 31))
            .unwrap_err();
        assert!(matches!(err, RequestError::InvertedRange { .. }));
    }

    #[test]
    fn session_lines() {
        let defaults = QueryDefaults::default();
        let today = day(2024, 12, 31);

        assert!(parse_session_line("   ", &defaults, today).unwrap().is_none());
        assert!(parse_session_line("# note", &defaults, today).unwrap().is_none());

        let only_ticker = parse_session_line("msft", &defaults, today).unwrap().unwrap();
        assert_eq!(only_ticker.symbol, "msft");
        assert_eq!(only_ticker.end(), today);

        let ranged = parse_session_line("TSLA 2024-01-02 2024-02-01", &defaults, today)
            .unwrap()
            .unwrap();
        assert_eq!(ranged.start(), day(2024, 1, 2));
        assert_eq!(ranged.end(), day(2024, 2, 1));

        assert!(parse_session_line("TSLA 2024-01-02", &defaults, today).is_err());
        let bad_date = parse_session_line("TSLA 2024-13-01 2024-02-01", &defaults, today)
            .unwrap_err();
        assert!(format!("{bad_date:#}").contains("YYYY-MM-DD"));
        assert!(parse_session_line("TSLA 2024-03-01 2024-02-01", &defaults, today).is_err());
    }

    #[test]
    fn cli_parses_report_arguments() {
        let cli = Cli::try_parse_from([
            "stock-insight",
            "--config",
            "insight.toml",
            "report",
            "--ticker",
            "NVDA",
            "--start",
            "2024-01-02",
            "--format",
            "text",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("insight.toml")));
        match cli.command {
            Command::Report { query, format } => {
                assert_eq!(query.ticker.as_deref(), Some("NVDA"));
                assert_eq!(query.start, Some(day(2024, 1, 2)));
                assert_eq!(query.end, None);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_malformed_dates() {
        let parsed = Cli::try_parse_from(["stock-insight", "series", "--start", "yesterday"]);
        assert!(parsed.is_err());
    }
}
