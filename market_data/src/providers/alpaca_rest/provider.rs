use async_trait::async_trait;
use reqwest::{Client, Url, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use tracing::debug;

use crate::{
    models::{bar::DailyBar, request_params::HistoryRequest, time_series::TimeSeries},
    providers::{
        DataProvider, HttpSettings, ProviderError, ProviderInitError,
        alpaca_rest::{
            params::{AlpacaBarsParams, DEFAULT_BASE_URL, construct_params, validate_symbol},
            response::AlpacaResponse,
        },
        build_client, parse_base_url,
    },
};

const USER_AGENT: &str = concat!("stock-insight/", env!("CARGO_PKG_VERSION"));

pub struct AlpacaProvider {
    client: Client,
    base_url: Url,
    params: AlpacaBarsParams,
    _api_key: SecretString,
    _secret_key: SecretString,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new(
        settings: &HttpSettings,
        params: AlpacaBarsParams,
    ) -> Result<Self, ProviderInitError> {
        let api_key = SecretString::from(get_env_var("APCA_API_KEY_ID")?);
        let secret_key = SecretString::from(get_env_var("APCA_API_SECRET_KEY")?);
        Self::with_credentials(settings, params, api_key, secret_key)
    }

    /// Creates a provider from explicit credentials.
    pub fn with_credentials(
        settings: &HttpSettings,
        params: AlpacaBarsParams,
        api_key: SecretString,
        secret_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(api_key.expose_secret())?;
        key_value.set_sensitive(true);
        headers.insert("APCA-API-KEY-ID", key_value);
        let mut secret_value = header::HeaderValue::from_str(secret_key.expose_secret())?;
        secret_value.set_sensitive(true);
        headers.insert("APCA-API-SECRET-KEY", secret_value);

        let base_url = parse_base_url(settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let client = build_client(settings, USER_AGENT, headers)?;

        Ok(Self {
            client,
            base_url,
            params,
            _api_key: api_key,
            _secret_key: secret_key,
        })
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    async fn fetch_daily_bars(
        &self,
        request: &HistoryRequest,
    ) -> Result<TimeSeries, ProviderError> {
        validate_symbol(&request.symbol)?;

        let mut all_bars: Vec<DailyBar> = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query_params = construct_params(request, &self.params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let response = self
                .client
                .get(self.base_url.clone())
                .query(&query_params)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                return Err(ProviderError::Api { status, message });
            }

            let mut alpaca_response = response.json::<AlpacaResponse>().await?;
            pages += 1;
            all_bars.extend(alpaca_response.take_daily_bars(&request.symbol));

            match alpaca_response.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        debug!(symbol = %request.symbol, pages, bars = all_bars.len(), "alpaca bars fetched");

        let mut series = TimeSeries::new(&request.symbol, all_bars);
        series.retain_range(&request.range);
        if series.is_empty() {
            return Err(ProviderError::NoData(request.symbol.clone()));
        }
        Ok(series)
    }
}
