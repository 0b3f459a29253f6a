//! Runtime configuration: parsing, validation, and loading.
//!
//! The configuration is a small TOML document; every section and field is
//! optional and falls back to the defaults below:
//!
//! ```toml
//! [provider]
//! kind = "yahoo"          # yahoo | alpaca | fixture
//!
//! [fetch]
//! timeout_secs = 10
//! max_retries = 1
//! base_delay_ms = 500
//!
//! [cache]
//! capacity = 32
//!
//! [indicators]
//! short_window = 50
//! long_window = 200
//!
//! [defaults]
//! ticker = "AAPL"
//! lookback_days = 365
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - Pick the file from the command line or `STOCK_INSIGHT_CONFIG`: [`resolve_config`]

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail};
use market_data::{
    cache::CachePolicy,
    fetcher::{FetchSettings, RetryPolicy},
    providers::{
        DataProvider, HttpSettings,
        alpaca_rest::{
            AlpacaBarsParams, AlpacaProvider,
            params::{Adjustment, Feed},
        },
        fixture::FixtureProvider,
        yahoo_chart::YahooChartProvider,
    },
};
use serde::{Deserialize, Serialize};
use shared_utils::env::optional_env_var;
use tracing::info;

use crate::pipeline::Windows;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "STOCK_INSIGHT_CONFIG";

/// The whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub provider: ProviderCfg,
    pub fetch: FetchCfg,
    pub cache: CacheCfg,
    pub indicators: IndicatorCfg,
    pub defaults: QueryDefaults,
}

/// Which upstream source to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Alpaca,
    Fixture,
}

/// Upstream source settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderCfg {
    pub kind: ProviderKind,
    /// Overrides the provider's endpoint.
    pub base_url: Option<String>,
    /// Overrides the provider's `User-Agent`.
    pub user_agent: Option<String>,
    /// JSON file of saved series; required for `kind = "fixture"`.
    pub fixture_path: Option<PathBuf>,
    /// Alpaca only.
    pub feed: Option<Feed>,
    /// Alpaca only.
    pub adjustment: Option<Adjustment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FetchCfg {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 1,
            base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheCfg {
    /// Maximum number of cached series.
    pub capacity: usize,
    /// Entries older than this are refetched; absent means they never expire.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            capacity: 32,
            ttl_secs: None,
        }
    }
}

/// Moving-average windows, in rows.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndicatorCfg {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for IndicatorCfg {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

/// What to query when the user does not say.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct QueryDefaults {
    pub ticker: String,
    /// Length of the default range, ending today.
    pub lookback_days: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            lookback_days: 365,
        }
    }
}

impl Config {
    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.windows()?;
        self.cache_policy()?;
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be greater than zero");
        }
        if self.defaults.ticker.trim().is_empty() {
            bail!("defaults.ticker cannot be empty after trimming");
        }
        if self.provider.kind == ProviderKind::Fixture && self.provider.fixture_path.is_none() {
            bail!("provider.fixture_path is required when provider.kind = \"fixture\"");
        }
        Ok(())
    }

    pub fn windows(&self) -> anyhow::Result<Windows> {
        let short = NonZeroUsize::new(self.indicators.short_window)
            .context("indicators.short_window must be greater than zero")?;
        let long = NonZeroUsize::new(self.indicators.long_window)
            .context("indicators.long_window must be greater than zero")?;
        Ok(Windows { short, long })
    }

    pub fn cache_policy(&self) -> anyhow::Result<CachePolicy> {
        let capacity = NonZeroUsize::new(self.cache.capacity)
            .context("cache.capacity must be greater than zero")?;
        Ok(CachePolicy {
            capacity: Some(capacity),
            ttl: self.cache.ttl_secs.map(Duration::from_secs),
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            retry: RetryPolicy {
                max_retries: self.fetch.max_retries,
                base_delay: Duration::from_millis(self.fetch.base_delay_ms),
            },
        }
    }
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Read a configuration file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
        .with_context(|| format!("load config file {}", path.as_ref().display()))
}

/// Loads the configuration named by `explicit`, else by [`CONFIG_ENV_VAR`],
/// else returns the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| optional_env_var(CONFIG_ENV_VAR).map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            load_config_path(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Builds the configured upstream provider.
///
/// The HTTP client timeout matches the fetch timeout.
pub fn build_provider(config: &Config) -> anyhow::Result<Box<dyn DataProvider>> {
    let cfg = &config.provider;
    let http = HttpSettings {
        timeout: Duration::from_secs(config.fetch.timeout_secs),
        base_url: cfg.base_url.clone(),
        user_agent: cfg.user_agent.clone(),
    };

    let provider: Box<dyn DataProvider> = match cfg.kind {
        ProviderKind::Yahoo => {
            Box::new(YahooChartProvider::new(&http).context("build Yahoo provider")?)
        }
        ProviderKind::Alpaca => {
            let params = AlpacaBarsParams {
                adjustment: cfg.adjustment,
                feed: cfg.feed,
                limit: None,
            };
            Box::new(AlpacaProvider::new(&http, params).context("build Alpaca provider")?)
        }
        ProviderKind::Fixture => {
            let path = cfg
                .fixture_path
                .as_deref()
                .context("provider.fixture_path is required for the fixture provider")?;
            Box::new(FixtureProvider::from_path(path).context("load fixture provider")?)
        }
    };
    info!(provider = provider.name(), "provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.provider.kind, ProviderKind::Yahoo);
        assert_eq!(config.defaults.ticker, "AAPL");
        assert_eq!(config.defaults.lookback_days, 365);

        let windows = config.windows().unwrap();
        assert_eq!((windows.short.get(), windows.long.get()), (50, 200));

        let fetch = config.fetch_settings();
        assert_eq!(fetch.timeout, Duration::from_secs(10));
        assert_eq!(fetch.retry.max_retries, 1);
        assert_eq!(fetch.retry.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = load_config_str(
            r#"
            [provider]
            kind = "alpaca"
            feed = "iex"
            adjustment = "all"

            [cache]
            ttl_secs = 900

            [indicators]
            short_window = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Alpaca);
        assert_eq!(config.provider.feed, Some(Feed::Iex));
        assert_eq!(config.provider.adjustment, Some(Adjustment::All));
        assert_eq!(config.indicators.short_window, 20);
        assert_eq!(config.indicators.long_window, 200);

        let policy = config.cache_policy().unwrap();
        assert_eq!(policy.capacity.map(NonZeroUsize::get), Some(32));
        assert_eq!(policy.ttl, Some(Duration::from_secs(900)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_config_str("[fetch]\ntimeout = 3\n").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = load_config_str("[indicators]\nlong_window = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("long_window"));
    }

    #[test]
    fn fixture_requires_a_path() {
        let err = load_config_str("[provider]\nkind = \"fixture\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("fixture_path"));
    }

    #[test]
    fn missing_file_mentions_the_path() {
        let err = load_config_path("/definitely/not/here.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
    }

    #[test]
    #[serial]
    fn environment_variable_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[defaults]\nticker = \"MSFT\"\n").unwrap();

        unsafe { std::env::set_var(CONFIG_ENV_VAR, file.path()) };
        let config = resolve_config(None);
        unsafe { std::env::remove_var(CONFIG_ENV_VAR) };

        assert_eq!(config.unwrap().defaults.ticker, "MSFT");
    }

    #[test]
    #[serial]
    fn no_file_means_defaults() {
        unsafe { std::env::remove_var(CONFIG_ENV_VAR) };
        assert_eq!(resolve_config(None).unwrap(), Config::default());
    }

    #[test]
    fn fixture_provider_is_built_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"[{"symbol": "TEST", "bars": []}]"#).unwrap();

        let mut config = Config::default();
        config.provider.kind = ProviderKind::Fixture;
        config.provider.fixture_path = Some(file.path().to_path_buf());

        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "fixture");
    }
}
